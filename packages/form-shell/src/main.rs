// Interactive terminal host for the employee registration form

mod command;
mod render;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use employee_form::{
    DuplicateCheck, FormConfig, FormRuntime, HttpDuplicateCheckClient, HttpSubmissionClient,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::command::{ShellCommand, HELP};

#[derive(Parser, Debug)]
#[command(name = "form-shell", about = "Register employees from the terminal")]
struct Cli {
    /// Base URL of the employee services (overrides EMPLOYEE_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Disable duplicate checking of employee ID and email
    #[arg(long)]
    no_duplicate_check: bool,

    /// Only accept emails from this domain (overrides CORPORATE_EMAIL_DOMAIN)
    #[arg(long)]
    corporate_domain: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,employee_form=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = FormConfig::from_env().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    if cli.no_duplicate_check {
        config = config.with_duplicate_check(false);
    }
    if let Some(domain) = cli.corporate_domain {
        config = config.with_corporate_domain(domain);
    }
    tracing::info!(api_url = %config.api_url, "Configuration loaded");

    let lookup: Option<Arc<dyn DuplicateCheck>> = if config.duplicate_check {
        let client = HttpDuplicateCheckClient::from_config(&config)
            .context("Failed to build lookup client")?;
        Some(Arc::new(client))
    } else {
        None
    };
    let creator = HttpSubmissionClient::from_config(&config)
        .context("Failed to build submission client")?;

    let (runtime, handle) = FormRuntime::new(&config, lookup, Arc::new(creator));
    let runtime_task = tokio::spawn(runtime.run());

    // Announce async results as they land
    let mut views = handle.subscribe();
    let announcer = tokio::spawn(async move {
        let mut previous = views.borrow().clone();
        while views.changed().await.is_ok() {
            let next = views.borrow_and_update().clone();
            for line in render::describe_changes(&previous, &next) {
                println!("{line}");
            }
            previous = next;
        }
    });

    println!("{}", "Employee registration".bright_cyan().bold());
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let command = match command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{}", err.to_string().red());
                continue;
            }
        };

        match command {
            ShellCommand::Set(field, value) => {
                handle.edit(field, value);
            }
            ShellCommand::Submit => {
                handle.submit();
            }
            ShellCommand::Reset => {
                handle.reset();
                println!("{}", "Form cleared".dimmed());
            }
            ShellCommand::Show => {
                println!("{}", render::render_form(&handle.view(), &config.departments));
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
        }
    }

    drop(handle);
    runtime_task.await.context("Form runtime panicked")?;
    announcer.abort();

    Ok(())
}
