use std::io::{BufRead, Write};
use std::path::Path;

use log::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::prompt::Prompter;
use crate::provider::DnsApi;

/// Completes the configuration before any domain is processed, then saves it.
///
/// The API token is needed to talk to the provider, so `connect` is only
/// called once a token is known. The connected client is handed back for
/// the selected mode to use.
pub async fn run<A, F, R, W>(
    config: &mut Config,
    config_path: &Path,
    prompter: &mut Prompter<R, W>,
    connect: F,
) -> Result<A>
where
    A: DnsApi,
    F: FnOnce(&str) -> Result<A>,
    R: BufRead,
    W: Write,
{
    ensure_api_token(config, prompter)?;
    let api = connect(&config.api_token)?;

    ensure_domains(config, &api, prompter).await?;
    ensure_subdomain_lists(config);

    config.persist(config_path);
    Ok(api)
}

/// Asks for a token when none is stored. Surrounding whitespace from the
/// terminal is trimmed before it is kept.
pub fn ensure_api_token<R: BufRead, W: Write>(
    config: &mut Config,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    if !config.api_token.is_empty() {
        return Ok(());
    }

    let token = prompter.ask("Enter your Cloudflare API Token: ")?;
    if token.is_empty() {
        return Err(Error::config("an API token is required"));
    }
    config.api_token = token;
    Ok(())
}

pub async fn ensure_domains<A, R, W>(
    config: &mut Config,
    api: &A,
    prompter: &mut Prompter<R, W>,
) -> Result<()>
where
    A: DnsApi + ?Sized,
    R: BufRead,
    W: Write,
{
    if !config.domains.is_empty() {
        return Ok(());
    }

    let zones: Vec<String> = api.list_zones().await?.into_iter().map(|z| z.name).collect();
    if zones.is_empty() {
        return Err(Error::config("the API token has access to no zones"));
    }

    let chosen = prompter.choose(
        "Available domains:",
        &zones,
        "Enter the numbers of the domains to manage (comma-separated): ",
    )?;

    config.domains = chosen.into_iter().cloned().collect();
    info!("Managing domains: {}", config.domains.join(", "));
    Ok(())
}

/// Gives every configured domain a subdomain list, leaving existing lists as
/// they are.
pub fn ensure_subdomain_lists(config: &mut Config) {
    for domain in &config.domains {
        config
            .selected_subdomains
            .entry(domain.clone())
            .or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fake::FakeDnsApi;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn zones() -> FakeDnsApi {
        FakeDnsApi::new()
            .with_zone("z1", "example.com", vec![])
            .with_zone("z2", "example.org", vec![])
            .with_zone("z3", "example.net", vec![])
    }

    #[tokio::test]
    async fn test_first_run_prompts_for_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        let mut input = prompter("tok\n3,1\n");

        let mut seen_token = String::new();
        bootstrap_run(&mut config, &path, &mut input, &mut seen_token).await;

        assert_eq!(seen_token, "tok");
        assert_eq!(config.api_token, "tok");
        assert_eq!(config.domains, vec!["example.net", "example.com"]);
        assert_eq!(config.subdomains("example.net").len(), 0);
        assert!(config.selected_subdomains.contains_key("example.com"));
        assert_eq!(Config::load(&path), config);
    }

    async fn bootstrap_run(
        config: &mut Config,
        path: &Path,
        input: &mut Prompter<Cursor<Vec<u8>>, Vec<u8>>,
        seen_token: &mut String,
    ) {
        run(config, path, input, |token| {
            *seen_token = token.to_string();
            Ok(zones())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_complete_config_is_left_alone_but_saved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config {
            api_token: "t".into(),
            domains: vec!["example.com".into()],
            ..Default::default()
        };
        config.add_subdomains("example.com", vec!["home.example.com".into()]);
        let before = config.clone();

        let mut input = prompter("");
        let mut seen_token = String::new();
        bootstrap_run(&mut config, &path, &mut input, &mut seen_token).await;

        assert_eq!(config, before);
        assert!(path.exists());
        assert!(input.into_output().is_empty());
    }

    #[test]
    fn test_subdomain_lists_are_not_overwritten() {
        let mut config = Config {
            domains: vec!["example.com".into(), "example.org".into()],
            ..Default::default()
        };
        config.add_subdomains("example.com", vec!["home.example.com".into()]);

        ensure_subdomain_lists(&mut config);

        assert_eq!(config.subdomains("example.com"), ["home.example.com".to_string()]);
        assert!(config.selected_subdomains["example.org"].is_empty());
    }

    #[test]
    fn test_entered_token_is_trimmed() {
        let mut config = Config::default();
        let mut input = prompter("  abc123 \r\n");

        ensure_api_token(&mut config, &mut input).unwrap();
        assert_eq!(config.api_token, "abc123");
    }

    #[test]
    fn test_blank_token_is_rejected() {
        let mut config = Config::default();
        let mut input = prompter("   \n");
        assert!(matches!(
            ensure_api_token(&mut config, &mut input),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_domain_menu_rejects_out_of_range_then_accepts() {
        let mut config = Config::default();
        let mut input = prompter("9\n2\n");

        ensure_domains(&mut config, &zones(), &mut input).await.unwrap();

        assert_eq!(config.domains, vec!["example.org"]);
        let shown = String::from_utf8(input.into_output()).unwrap();
        assert!(shown.contains("1. example.com\n2. example.org\n3. example.net\n"));
        assert!(shown.contains("out of range"));
    }

    #[tokio::test]
    async fn test_connect_failure_stops_bootstrap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config {
            api_token: "t".into(),
            ..Default::default()
        };
        let mut input = prompter("");

        let result = run(&mut config, &path, &mut input, |_| -> Result<FakeDnsApi> {
            Err(Error::config("bad client"))
        })
        .await;

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
