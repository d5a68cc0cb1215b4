use serde::de::DeserializeOwned;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

#[cfg(test)]
mod tests {
    use pal_core::enums::{AuditAction, Level, Role};

    use super::parse_enum;

    #[test]
    fn parses_snake_case_enum() {
        let role: Role = parse_enum("supervisor", "role").expect("role should parse");
        assert_eq!(role, Role::Supervisor);
    }

    #[test]
    fn parses_hyphenated_alias() {
        let level: Level = parse_enum("moniteur-federal1", "level").expect("level should parse");
        assert_eq!(level, Level::MoniteurFederal1);
        let action: AuditAction =
            parse_enum("link-closed", "action").expect("action should parse");
        assert_eq!(action, AuditAction::LinkClosed);
    }

    #[test]
    fn errors_on_invalid_enum() {
        let err = parse_enum::<Level>("niveau9", "level").expect_err("should fail");
        assert!(err.to_string().contains("invalid level 'niveau9'"));
    }
}
