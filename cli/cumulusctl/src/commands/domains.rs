//! Domain commands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use cumulus_client::{AddDomainRequest, ApiClient, Domain};
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{print_output, print_single, print_success, OutputFormat};
use crate::prompt::Prompt;
use crate::ssl;

use super::CommandContext;

/// Domain commands.
#[derive(Debug, Args)]
pub struct DomainsCommand {
    #[command(subcommand)]
    command: DomainsSubcommand,
}

#[derive(Debug, Subcommand)]
enum DomainsSubcommand {
    /// List domains attached to the project.
    List,

    /// Add a new domain to the project.
    Add(AddDomainArgs),
}

#[derive(Debug, Args)]
struct AddDomainArgs {
    /// The name of the domain.
    name: String,

    /// The path to the certificate file for this domain.
    #[arg(long, requires = "key")]
    cert: Option<PathBuf>,

    /// The path to the private key file for the provided certificate.
    #[arg(long, requires = "cert")]
    key: Option<PathBuf>,

    /// The path to the certificate chain file or files for the provided
    /// certificate.
    #[arg(long, requires = "cert")]
    chain: Vec<PathBuf>,
}

impl DomainsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<ExitCode> {
        match self.command {
            DomainsSubcommand::List => list(ctx).await,
            DomainsSubcommand::Add(args) => add(ctx, args).await,
        }
    }
}

/// Table row for domain listings.
#[derive(Debug, Serialize, Tabled)]
struct DomainRow {
    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Wildcard")]
    wildcard: bool,

    #[tabled(rename = "Created")]
    created_at: String,
}

impl From<&Domain> for DomainRow {
    fn from(domain: &Domain) -> Self {
        Self {
            name: domain.name.clone(),
            wildcard: domain.wildcard,
            created_at: domain.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// List all domains in the current project.
async fn list(ctx: CommandContext) -> Result<ExitCode> {
    let project = ctx.require_project()?;
    let client = ctx.client()?;

    let domains = client.domains(&project).await?;

    match ctx.format {
        OutputFormat::Table => {
            let rows: Vec<DomainRow> = domains.iter().map(DomainRow::from).collect();
            print_output(&rows, ctx.format);
        }
        OutputFormat::Json => print_single(&domains, ctx.format),
    }

    Ok(ExitCode::SUCCESS)
}

/// Add a new domain to the project.
async fn add(ctx: CommandContext, args: AddDomainArgs) -> Result<ExitCode> {
    let project = ctx.require_project()?;
    let client = ctx.client()?;
    let mut prompt = ctx.prompt();

    let domain = add_domain_flow(
        &client,
        &project,
        &args.name,
        args.cert.as_deref(),
        args.key.as_deref(),
        &args.chain,
        prompt.as_mut(),
    )
    .await?;

    print_success(&format!(
        "The domain {} was added to the project",
        domain.name.cyan()
    ));
    Ok(ExitCode::SUCCESS)
}

/// Validate local input, then submit the single domain-creation call.
/// Nothing is submitted unless every local check passes.
async fn add_domain_flow(
    client: &ApiClient,
    project: &str,
    name: &str,
    cert: Option<&Path>,
    key: Option<&Path>,
    chain: &[PathBuf],
    prompt: &mut dyn Prompt,
) -> Result<Domain> {
    if !ssl::valid_domain(name) {
        return Err(CliError::Validation("You must specify a valid domain name.".to_string()).into());
    }

    let ssl_bundle = match (cert, key) {
        (Some(cert), Some(key)) => Some(
            ssl::validate_ssl_material(cert, key, chain).map_err(CliError::from)?,
        ),
        _ => None,
    };

    let wildcard = prompt.confirm("Is your domain a wildcard?", false)?;

    let request = AddDomainRequest {
        name: name.to_string(),
        wildcard,
        ssl: ssl_bundle,
    };
    Ok(client.add_domain(project, &request).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use serde_json::json;
    use std::fs;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn invalid_domain_name_never_reaches_the_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/p1/domains"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), None).unwrap();
        let mut prompt = ScriptedPrompt::new([]);

        let err = add_domain_flow(&client, "p1", "localhost", None, None, &[], &mut prompt)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("valid domain name"));
    }

    #[tokio::test]
    async fn mismatched_ssl_material_never_reaches_the_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/p1/domains"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let signed = rcgen::generate_simple_self_signed(vec!["example.com".to_string()]).unwrap();
        let other = rcgen::generate_simple_self_signed(vec!["other.com".to_string()]).unwrap();
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        fs::write(&cert_path, signed.cert.pem()).unwrap();
        fs::write(&key_path, other.key_pair.serialize_pem()).unwrap();

        let client = ApiClient::new(&server.uri(), None).unwrap();
        let mut prompt = ScriptedPrompt::new([]);

        let err = add_domain_flow(
            &client,
            "p1",
            "example.com",
            Some(&cert_path),
            Some(&key_path),
            &[],
            &mut prompt,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[tokio::test]
    async fn valid_domain_is_submitted_with_wildcard_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/p1/domains"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "name": "example.com",
                "wildcard": true,
                "created_at": "2024-03-01T12:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), None).unwrap();
        let mut prompt = ScriptedPrompt::new([true]);

        let domain = add_domain_flow(&client, "p1", "example.com", None, None, &[], &mut prompt)
            .await
            .unwrap();
        assert!(domain.wildcard);
    }
}
