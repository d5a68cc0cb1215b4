//! Integration tests for TOML and environment configuration loading.
//!
//! Uses figment::Jail for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pal_config::{ConfigError, PalConfig};
use pretty_assertions::assert_eq;

#[test]
fn loads_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = "club.db"

[links]
ttl_days = 14
public_base_url = "https://club.example"

[general]
default_limit = 50
club_name = "Les Mérous"
"#,
        )?;

        let config: PalConfig = Figment::from(Serialized::defaults(PalConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.database.path, "club.db");
        assert_eq!(config.links.ttl_days, 14);
        assert_eq!(config.links.url_for("t0k"), "https://club.example/evaluation/t0k/");
        assert_eq!(config.general.default_limit, 50);
        assert_eq!(config.general.club_name, "Les Mérous");
        assert!(config.validate().is_ok());
        Ok(())
    });
}

#[test]
fn partial_toml_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[links]\npublic_base_url = \"http://localhost:8000\"\n")?;

        let config: PalConfig = Figment::from(Serialized::defaults(PalConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.links.ttl_days, 30);
        assert_eq!(config.database.path, ".palanquee/palanquee.db");
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".palanquee")?;
        jail.create_file(".palanquee/config.toml", "[links]\nttl_days = 7\n")?;

        let config = PalConfig::load().expect("config loads");
        assert_eq!(config.links.ttl_days, 7);
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_dir(".palanquee")?;
        jail.create_file(".palanquee/config.toml", "[links]\nttl_days = 7\n")?;
        jail.set_env("PALANQUEE_LINKS__TTL_DAYS", "3");
        jail.set_env("PALANQUEE_DATABASE__PATH", ":memory:");

        let config = PalConfig::load().expect("config loads");
        assert_eq!(config.links.ttl_days, 3);
        assert!(config.database.is_in_memory());
        Ok(())
    });
}

#[test]
fn env_provider_alone_maps_nested_keys() {
    Jail::expect_with(|jail| {
        jail.set_env("PALANQUEE_GENERAL__CLUB_NAME", "CSA Plongée");

        let config: PalConfig = Figment::from(Serialized::defaults(PalConfig::default()))
            .merge(Env::prefixed("PALANQUEE_").split("__"))
            .extract()?;

        assert_eq!(config.general.club_name, "CSA Plongée");
        Ok(())
    });
}

#[test]
fn zero_ttl_loads_but_fails_validation() {
    Jail::expect_with(|jail| {
        jail.set_env("PALANQUEE_LINKS__TTL_DAYS", "0");

        let config = PalConfig::load().expect("config loads");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "links.ttl_days"));
        Ok(())
    });
}

#[test]
fn malformed_value_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.set_env("PALANQUEE_LINKS__TTL_DAYS", "soon");

        let err = PalConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
        Ok(())
    });
}
