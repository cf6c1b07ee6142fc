use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::{
    DirectoryClient,
    utils::{describe, summary_line, verification_link},
};
use indicatif::{ProgressBar, ProgressStyle};
use records::Certificate;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Admin tool for the certificate directory")]
struct Args {
    /// Directory endpoint, overrides CERTIFY_API_URL.
    #[arg(long)]
    endpoint: Option<String>,

    /// Overrides CERTIFY_TIMEOUT_SECS.
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up one certificate, any letter case.
    Search { certificate_no: String },

    /// List every certificate in table order.
    List,

    Add(AddArgs),

    Delete { certificate_no: String },

    /// Append every certificate from a JSON array file, in file order.
    Import { path: PathBuf },

    /// Print the public verification link that goes into the QR code.
    Link {
        certificate_no: String,

        #[arg(long)]
        origin: String,
    },
}

#[derive(clap::Args, Debug)]
struct AddArgs {
    #[arg(long)]
    certificate_no: String,

    #[arg(long)]
    student_name: String,

    #[arg(long)]
    father_name: String,

    #[arg(long, default_value = "6 Months")]
    duration: String,

    /// YYYY-MM-DD
    #[arg(long)]
    completion_date: String,

    #[arg(long, default_value = "Completed")]
    status: String,
}

impl From<AddArgs> for Certificate {
    fn from(args: AddArgs) -> Self {
        Certificate {
            certificate_no: args.certificate_no,
            student_name: args.student_name,
            father_name: args.father_name,
            duration: args.duration,
            completion_date: args.completion_date,
            status: args.status,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let client = DirectoryClient::from_env_with(
        args.endpoint.as_deref(),
        args.timeout_secs.map(Duration::from_secs),
    );

    match args.command {
        Command::Search { certificate_no } => {
            let Some(certificate) = client.fetch_certificate(&certificate_no).await else {
                bail!("No certificate found for {certificate_no}");
            };

            println!("{}", describe(&certificate));
        }
        Command::List => {
            let certificates = client.fetch_all_certificates().await;

            if certificates.is_empty() {
                println!("No certificates found.");
            }

            for certificate in &certificates {
                println!("{}", summary_line(certificate));
            }
        }
        Command::Add(add) => {
            let certificate = Certificate::from(add);
            let outcome = client.add_certificate(&certificate).await;

            if !outcome.success {
                bail!("Failed to add: {}", outcome.message);
            }

            println!("{}", outcome.message);
        }
        Command::Delete { certificate_no } => {
            let outcome = client.delete_certificate(&certificate_no).await;

            if !outcome.success {
                bail!("Failed to delete: {}", outcome.message);
            }

            println!("{}", outcome.message);
        }
        Command::Import { path } => import(&client, &path).await?,
        Command::Link {
            certificate_no,
            origin,
        } => {
            let link = verification_link(&origin, &certificate_no)
                .with_context(|| format!("Origin {origin} cannot carry a path"))?;

            println!("{link}");
        }
    }

    Ok(())
}

async fn import(client: &DirectoryClient, path: &Path) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let certificates: Vec<Certificate> =
        serde_json::from_str(&raw).context("Expected a JSON array of certificates")?;

    let pb = ProgressBar::new(certificates.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut failed = Vec::new();

    // Sequential, so the table keeps file order.
    for certificate in &certificates {
        pb.set_message(format!("Adding {}", certificate.certificate_no));

        let outcome = client.add_certificate(certificate).await;
        if !outcome.success {
            failed.push((certificate.certificate_no.clone(), outcome.message));
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");

    let total = client.fetch_all_certificates().await.len();

    println!("Imported: {}", certificates.len() - failed.len());
    println!("Failed: {}", failed.len());
    println!("Certificates in directory: {total}");

    for (certificate_no, message) in &failed {
        println!("  {certificate_no}: {message}");
    }

    if !failed.is_empty() {
        bail!("{} certificates were not imported", failed.len());
    }

    Ok(())
}
