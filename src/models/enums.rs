use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde goes through the same strings, so JSON and storage always agree.
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

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(|_| {
                    serde::de::Error::unknown_variant(&s, &[$($s),+])
                })
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
    Lab => "lab",
    Admin => "admin",
});

impl Role {
    /// Clinical roles can read and manage records across all patients.
    pub fn is_clinical(&self) -> bool {
        matches!(self, Role::Doctor | Role::Lab | Role::Admin)
    }
}

str_enum!(Sex {
    Male => "M",
    Female => "F",
    Other => "O",
});

str_enum!(ResultFlag {
    Normal => "normal",
    High => "high",
    Low => "low",
    NotAvailable => "not_available",
});

str_enum!(AlertLevel {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

str_enum!(AlertStatus {
    Open => "open",
    Closed => "closed",
});
