//! Repository functions for folders (ingestion jobs), parties, assets and
//! operations.
//!
//! Party and asset writes are idempotent upserts on natural keys (national ID
//! for parties, jurisdiction + parcel number for assets) so re-running a
//! failed ingestion never duplicates rows.

use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::JobStatus;

fn now() -> String {
    Utc::now().to_rfc3339()
}

// ═══════════════════════════════════════════
// Folders (carpetas): the job rows
// ═══════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct FolderRow {
    pub id: Uuid,
    pub caratula: String,
    pub status: JobStatus,
    pub step: Option<String>,
    pub summary: Option<String>,
    pub storage_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub fn create_folder(
    conn: &Connection,
    id: &Uuid,
    caratula: &str,
    status: JobStatus,
    step: &str,
) -> Result<(), DatabaseError> {
    let ts = now();
    conn.execute(
        "INSERT INTO carpetas (id, caratula, ingest_status, ingest_step, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![id.to_string(), caratula, status.as_str(), step, ts],
    )?;
    Ok(())
}

/// Advance the job's visible step label. Idempotent; last writer wins.
pub fn advance_folder(
    conn: &Connection,
    id: &Uuid,
    status: JobStatus,
    step: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE carpetas SET ingest_status = ?2, ingest_step = ?3, updated_at = ?4 WHERE id = ?1",
        params![id.to_string(), status.as_str(), step, now()],
    )?;
    Ok(())
}

/// Mark the job completed with its final summary message.
pub fn complete_folder(conn: &Connection, id: &Uuid, summary: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE carpetas SET ingest_status = ?2, ingest_summary = ?3, updated_at = ?4
         WHERE id = ?1",
        params![
            id.to_string(),
            JobStatus::Completed.as_str(),
            summary,
            now()
        ],
    )?;
    Ok(())
}

/// Mark the job failed; the causing message becomes the step label.
pub fn fail_folder(conn: &Connection, id: &Uuid, message: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE carpetas SET ingest_status = ?2, ingest_step = ?3, updated_at = ?4 WHERE id = ?1",
        params![id.to_string(), JobStatus::Failed.as_str(), message, now()],
    )?;
    Ok(())
}

pub fn set_folder_storage_url(
    conn: &Connection,
    id: &Uuid,
    url: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE carpetas SET storage_url = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), url, now()],
    )?;
    Ok(())
}

pub fn get_folder(conn: &Connection, id: &Uuid) -> Result<Option<FolderRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, caratula, ingest_status, ingest_step, ingest_summary, storage_url,
                    created_at, updated_at
             FROM carpetas WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((id_str, caratula, status, step, summary, storage_url, created_at, updated_at)) = row
    else {
        return Ok(None);
    };

    Ok(Some(FolderRow {
        id: Uuid::parse_str(&id_str).map_err(|_| DatabaseError::InvalidEnum {
            field: "carpetas.id".into(),
            value: id_str,
        })?,
        caratula,
        status: JobStatus::from_str(&status)?,
        step,
        summary,
        storage_url,
        created_at,
        updated_at,
    }))
}

// ═══════════════════════════════════════════
// Parties (personas), keyed by national ID
// ═══════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct PersonRow {
    pub dni: String,
    pub nombre_completo: String,
    pub cuit: Option<String>,
    pub nacionalidad: Option<String>,
    pub estado_civil: Option<String>,
    pub domicilio: Option<String>,
    pub fecha_nacimiento: Option<String>,
    pub origen_dato: String,
}

pub fn upsert_person(conn: &Connection, person: &PersonRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO personas (dni, nombre_completo, cuit, nacionalidad, estado_civil,
                               domicilio, fecha_nacimiento, origen_dato, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(dni) DO UPDATE SET
             nombre_completo = excluded.nombre_completo,
             cuit = COALESCE(excluded.cuit, personas.cuit),
             nacionalidad = COALESCE(excluded.nacionalidad, personas.nacionalidad),
             estado_civil = COALESCE(excluded.estado_civil, personas.estado_civil),
             domicilio = COALESCE(excluded.domicilio, personas.domicilio),
             fecha_nacimiento = COALESCE(excluded.fecha_nacimiento, personas.fecha_nacimiento),
             origen_dato = excluded.origen_dato,
             updated_at = excluded.updated_at",
        params![
            person.dni,
            person.nombre_completo,
            person.cuit,
            person.nacionalidad,
            person.estado_civil,
            person.domicilio,
            person.fecha_nacimiento,
            person.origen_dato,
            now(),
        ],
    )?;
    Ok(())
}

pub fn get_person(conn: &Connection, dni: &str) -> Result<Option<PersonRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT dni, nombre_completo, cuit, nacionalidad, estado_civil, domicilio,
                    fecha_nacimiento, origen_dato
             FROM personas WHERE dni = ?1",
            params![dni],
            |row| {
                Ok(PersonRow {
                    dni: row.get(0)?,
                    nombre_completo: row.get(1)?,
                    cuit: row.get(2)?,
                    nacionalidad: row.get(3)?,
                    estado_civil: row.get(4)?,
                    domicilio: row.get(5)?,
                    fecha_nacimiento: row.get(6)?,
                    origen_dato: row.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

// ═══════════════════════════════════════════
// Assets (inmuebles), keyed by (partido, nro_partida)
// ═══════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct AssetRow {
    pub partido: String,
    pub nro_partida: String,
    pub nomenclatura: Option<String>,
    pub transcripcion_literal: Option<String>,
    pub valuacion_fiscal: f64,
}

/// Upsert an asset on its natural key, returning the row id (existing or new).
pub fn upsert_asset(conn: &Connection, asset: &AssetRow) -> Result<Uuid, DatabaseError> {
    let candidate = Uuid::new_v4();
    conn.execute(
        "INSERT INTO inmuebles (id, partido, nro_partida, nomenclatura, transcripcion_literal,
                                valuacion_fiscal, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(partido, nro_partida) DO UPDATE SET
             nomenclatura = COALESCE(excluded.nomenclatura, inmuebles.nomenclatura),
             transcripcion_literal =
                 COALESCE(excluded.transcripcion_literal, inmuebles.transcripcion_literal),
             valuacion_fiscal = excluded.valuacion_fiscal,
             updated_at = excluded.updated_at",
        params![
            candidate.to_string(),
            asset.partido,
            asset.nro_partida,
            asset.nomenclatura,
            asset.transcripcion_literal,
            asset.valuacion_fiscal,
            now(),
        ],
    )?;

    let id_str: String = conn.query_row(
        "SELECT id FROM inmuebles WHERE partido = ?1 AND nro_partida = ?2",
        params![asset.partido, asset.nro_partida],
        |row| row.get(0),
    )?;
    Uuid::parse_str(&id_str).map_err(|_| DatabaseError::InvalidEnum {
        field: "inmuebles.id".into(),
        value: id_str,
    })
}

// ═══════════════════════════════════════════
// Operations (operaciones) and participant links
// ═══════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct OperationRow {
    pub id: Uuid,
    pub carpeta_id: Uuid,
    pub inmueble_id: Option<Uuid>,
    pub tipo_acto: String,
    pub monto: f64,
    pub moneda: String,
    pub nro_acto: Option<String>,
}

pub fn insert_operation(conn: &Connection, op: &OperationRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO operaciones (id, carpeta_id, inmueble_id, tipo_acto, monto, moneda,
                                  nro_acto, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            op.id.to_string(),
            op.carpeta_id.to_string(),
            op.inmueble_id.map(|id| id.to_string()),
            op.tipo_acto,
            op.monto,
            op.moneda,
            op.nro_acto,
            now(),
        ],
    )?;
    Ok(())
}

/// Link a persisted party to an operation with its role. Idempotent.
pub fn link_participant(
    conn: &Connection,
    operacion_id: &Uuid,
    persona_dni: &str,
    rol: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO participantes_operacion (operacion_id, persona_id, rol)
         VALUES (?1, ?2, ?3)",
        params![operacion_id.to_string(), persona_dni, rol],
    )?;
    Ok(())
}

pub fn count_operations_for_folder(conn: &Connection, folder_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM operaciones WHERE carpeta_id = ?1",
        params![folder_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// (dni, rol) pairs for an operation, ordered by role.
pub fn participants_for_operation(
    conn: &Connection,
    operacion_id: &Uuid,
) -> Result<Vec<(String, String)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT persona_id, rol FROM participantes_operacion
         WHERE operacion_id = ?1 ORDER BY rol",
    )?;
    let rows = stmt
        .query_map(params![operacion_id.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn conn() -> Connection {
        open_memory_database().unwrap()
    }

    #[test]
    fn folder_lifecycle() {
        let conn = conn();
        let id = Uuid::new_v4();
        create_folder(&conn, &id, "escritura_45.pdf", JobStatus::Processing, "mapping document")
            .unwrap();

        let folder = get_folder(&conn, &id).unwrap().unwrap();
        assert_eq!(folder.status, JobStatus::Processing);
        assert_eq!(folder.step.as_deref(), Some("mapping document"));
        assert!(folder.summary.is_none());

        advance_folder(&conn, &id, JobStatus::Processing, "classified as ESCRITURA").unwrap();
        complete_folder(&conn, &id, "IA: 2 personas, 1 inmuebles").unwrap();

        let folder = get_folder(&conn, &id).unwrap().unwrap();
        assert_eq!(folder.status, JobStatus::Completed);
        assert_eq!(folder.summary.as_deref(), Some("IA: 2 personas, 1 inmuebles"));
    }

    #[test]
    fn fail_folder_puts_message_in_step() {
        let conn = conn();
        let id = Uuid::new_v4();
        create_folder(&conn, &id, "x", JobStatus::Processing, "start").unwrap();
        fail_folder(&conn, &id, "Semantic execution failed for notary-entity-extractor").unwrap();

        let folder = get_folder(&conn, &id).unwrap().unwrap();
        assert_eq!(folder.status, JobStatus::Failed);
        assert!(folder.step.unwrap().contains("notary-entity-extractor"));
    }

    #[test]
    fn get_missing_folder_returns_none() {
        let conn = conn();
        assert!(get_folder(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    fn person(dni: &str, name: &str) -> PersonRow {
        PersonRow {
            dni: dni.into(),
            nombre_completo: name.into(),
            cuit: None,
            nacionalidad: None,
            estado_civil: None,
            domicilio: None,
            fecha_nacimiento: None,
            origen_dato: "IA_OCR".into(),
        }
    }

    #[test]
    fn upsert_person_is_idempotent_on_dni() {
        let conn = conn();
        upsert_person(&conn, &person("20123456789", "Juan Perez")).unwrap();
        upsert_person(&conn, &person("20123456789", "Juan Pérez")).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM personas", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let row = get_person(&conn, "20123456789").unwrap().unwrap();
        assert_eq!(row.nombre_completo, "Juan Pérez");
    }

    #[test]
    fn upsert_person_keeps_known_fields_on_sparse_update() {
        let conn = conn();
        let mut first = person("27999888777", "Ana López");
        first.cuit = Some("27-99988877-1".into());
        first.nacionalidad = Some("Argentina".into());
        upsert_person(&conn, &first).unwrap();

        // Second extraction knows the name only; it must not erase cuit/nationality.
        upsert_person(&conn, &person("27999888777", "Ana Lopez")).unwrap();

        let row = get_person(&conn, "27999888777").unwrap().unwrap();
        assert_eq!(row.cuit.as_deref(), Some("27-99988877-1"));
        assert_eq!(row.nacionalidad.as_deref(), Some("Argentina"));
    }

    fn asset(partido: &str, partida: &str) -> AssetRow {
        AssetRow {
            partido: partido.into(),
            nro_partida: partida.into(),
            nomenclatura: None,
            transcripcion_literal: None,
            valuacion_fiscal: 1000.0,
        }
    }

    #[test]
    fn upsert_asset_returns_same_id_for_same_natural_key() {
        let conn = conn();
        let id1 = upsert_asset(&conn, &asset("BAHIA BLANCA", "123456")).unwrap();
        let id2 = upsert_asset(&conn, &asset("BAHIA BLANCA", "123456")).unwrap();
        assert_eq!(id1, id2);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM inmuebles", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn upsert_asset_distinct_jurisdictions_create_distinct_rows() {
        let conn = conn();
        let id1 = upsert_asset(&conn, &asset("BAHIA BLANCA", "123456")).unwrap();
        let id2 = upsert_asset(&conn, &asset("CORONEL ROSALES", "123456")).unwrap();
        assert_ne!(id1, id2);
    }

    #[test]
    fn operation_and_participant_links() {
        let conn = conn();
        let folder_id = Uuid::new_v4();
        create_folder(&conn, &folder_id, "f", JobStatus::Processing, "s").unwrap();
        upsert_person(&conn, &person("20123456789", "Juan Perez")).unwrap();

        let op = OperationRow {
            id: Uuid::new_v4(),
            carpeta_id: folder_id,
            inmueble_id: None,
            tipo_acto: "COMPRAVENTA".into(),
            monto: 120000.0,
            moneda: "USD".into(),
            nro_acto: Some("45".into()),
        };
        insert_operation(&conn, &op).unwrap();
        assert_eq!(count_operations_for_folder(&conn, &folder_id).unwrap(), 1);

        link_participant(&conn, &op.id, "20123456789", "VENDEDOR").unwrap();
        // Re-linking is a no-op, not an error.
        link_participant(&conn, &op.id, "20123456789", "VENDEDOR").unwrap();

        let participants = participants_for_operation(&conn, &op.id).unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0], ("20123456789".into(), "VENDEDOR".into()));
    }
}
