//! Integration tests for TOML configuration loading.
//!
//! Uses `figment::Jail` for sandboxed file and env var manipulation.

use descope_config::DescopeConfig;
use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;

#[test]
fn loads_project_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[project]
id = "P2toml"
base_url = "https://auth.example.com"
"#,
        )?;

        let config: DescopeConfig = Figment::from(Serialized::defaults(DescopeConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.project.id, "P2toml");
        assert_eq!(config.project.api_base_url(), "https://auth.example.com");
        assert!(config.project.is_configured());
        Ok(())
    });
}

#[test]
fn loads_session_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[session]
leeway_secs = 0
request_timeout_secs = 5
session_cookie_name = "SESSION"
"#,
        )?;

        let config: DescopeConfig = Figment::from(Serialized::defaults(DescopeConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.session.leeway_secs, 0);
        assert_eq!(config.session.request_timeout_secs, 5);
        assert_eq!(config.session.session_cookie_name, "SESSION");
        assert_eq!(config.session.refresh_cookie_name, "DSR");
        Ok(())
    });
}

#[test]
fn project_local_file_is_picked_up_by_load() {
    Jail::expect_with(|jail| {
        jail.create_dir(".descope")?;
        jail.create_file(
            ".descope/config.toml",
            r#"
[project]
id = "P2local"
"#,
        )?;

        let config = DescopeConfig::load().expect("config loads");
        assert_eq!(config.project.id, "P2local");
        assert_eq!(config.project.api_base_url(), "https://api.descope.com");
        Ok(())
    });
}
