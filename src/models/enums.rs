use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde goes through the same string forms, so the wire format and the
/// database column always agree.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(DocumentType {
    Dni => "DNI",
    Pasaporte => "PASAPORTE",
    Escritura => "ESCRITURA",
    BoletoCompraventa => "BOLETO_COMPRAVENTA",
    CertificadoRpi => "CERTIFICADO_RPI",
    CatastroArba => "CATASTRO_ARBA",
    Unknown => "UNKNOWN",
});

impl DocumentType {
    /// Identity documents route to the vision-capable identity skill.
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Dni | Self::Pasaporte)
    }

    /// Deed-like documents get the full extract + tax + compliance fan-out.
    pub fn is_deed_like(&self) -> bool {
        matches!(self, Self::Escritura | Self::BoletoCompraventa)
    }
}

str_enum!(JobStatus {
    Queued => "queued",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

impl JobStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn document_type_roundtrip() {
        for dt in [
            DocumentType::Dni,
            DocumentType::Pasaporte,
            DocumentType::Escritura,
            DocumentType::BoletoCompraventa,
            DocumentType::CertificadoRpi,
            DocumentType::CatastroArba,
            DocumentType::Unknown,
        ] {
            let parsed = DocumentType::from_str(dt.as_str()).unwrap();
            assert_eq!(parsed, dt, "Roundtrip failed for {dt}");
        }
    }

    #[test]
    fn document_type_from_invalid() {
        assert!(DocumentType::from_str("FACTURA").is_err());
        assert!(DocumentType::from_str("").is_err());
    }

    #[test]
    fn identity_and_deed_like_partitions() {
        assert!(DocumentType::Dni.is_identity());
        assert!(DocumentType::Pasaporte.is_identity());
        assert!(!DocumentType::Escritura.is_identity());

        assert!(DocumentType::Escritura.is_deed_like());
        assert!(DocumentType::BoletoCompraventa.is_deed_like());
        assert!(!DocumentType::CatastroArba.is_deed_like());
        assert!(!DocumentType::Unknown.is_deed_like());
    }

    #[test]
    fn job_status_roundtrip() {
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            let parsed = JobStatus::from_str(status.as_str()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn serde_uses_string_forms() {
        assert_eq!(
            serde_json::to_string(&DocumentType::BoletoCompraventa).unwrap(),
            "\"BOLETO_COMPRAVENTA\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"completed\""
        );
        let parsed: JobStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, JobStatus::Failed);
        assert!(serde_json::from_str::<JobStatus>("\"FAILED\"").is_err());
    }

    #[test]
    fn job_status_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }
}
