use crate::common::error::MarketError;

/// Declares a string-backed enum stored as its upper-case name.
macro_rules! sql_enum {
    ($(#[$meta:meta])* $name:ident { $( $variant:ident => $text:literal ),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $( #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$( $text ),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = MarketError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(MarketError::bad_request(
                        stringify!($name),
                        "invalidEnumValue",
                        format!("'{}' is not a valid {}", other, stringify!($name)),
                    )),
                }
            }
        }

        impl $crate::storage::codec::SqlColumn for $name {
            fn decode(value: ::rusqlite::types::Value) -> Result<Self, String> {
                match value {
                    ::rusqlite::types::Value::Text(s) => s.parse().map_err(|e: MarketError| e.to_string()),
                    other => Err(format!("expected enum text, found {:?}", other.data_type())),
                }
            }

            fn encode(&self) -> ::rusqlite::types::Value {
                ::rusqlite::types::Value::Text(self.as_str().to_string())
            }
        }
    };
}

sql_enum!(OfferStatus {
    Active => "ACTIVE",
    Paused => "PAUSED",
    Denied => "DENIED",
    Canceled => "CANCELED",
});

sql_enum!(OrderStatus {
    Pending => "PENDING",
    Active => "ACTIVE",
    Delivered => "DELIVERED",
    Completed => "COMPLETED",
    Canceled => "CANCELED",
    Disputed => "DISPUTED",
    Refunded => "REFUNDED",
});

sql_enum!(PackageTier {
    Basic => "BASIC",
    Premium => "PREMIUM",
    Standard => "STANDARD",
});

sql_enum!(MediaKind {
    Image => "IMAGE",
    Video => "VIDEO",
    Document => "DOCUMENT",
});

sql_enum!(ProfileType {
    Client => "CLIENT",
    Freelancer => "FREELANCER",
});

sql_enum!(VerificationRequestStatus {
    Pending => "PENDING",
    Completed => "COMPLETED",
    Rejected => "REJECTED",
    Canceled => "CANCELED",
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::codec::SqlColumn;

    #[test]
    fn parses_upper_case_names_only() {
        assert_eq!("DISPUTED".parse::<OrderStatus>().unwrap(), OrderStatus::Disputed);
        let err = "disputed".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.key(), "invalidEnumValue");
    }

    #[test]
    fn stored_as_text() {
        let value = MediaKind::Video.encode();
        assert_eq!(value, rusqlite::types::Value::Text("VIDEO".into()));
        assert_eq!(MediaKind::decode(value).unwrap(), MediaKind::Video);
        assert!(MediaKind::decode(rusqlite::types::Value::Text("GIF".into())).is_err());
    }

    #[test]
    fn values_list_every_variant() {
        assert_eq!(VerificationRequestStatus::VALUES.len(), 4);
        assert_eq!(serde_json::to_string(&PackageTier::Premium).unwrap(), "\"PREMIUM\"");
    }
}
