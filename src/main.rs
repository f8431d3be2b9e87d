use clap::{Args, Parser, Subcommand};
use roster_triage::config::{AppConfig, ContactColumns};
use roster_triage::error::AppError;
use roster_triage::telemetry;
use roster_triage::workflows::roster::{
    load_template, Classification, CsvRosterSource, Delivery, GoogleSheetsClient, MailTransport,
    Notifier, OutboxMailer, RosterSource, SheetLocation, SmtpMailer, TriageService, TriageSummary,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "roster-triage",
    about = "Classify membership applications from the roster sheet and email accepted applicants",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify, write the snapshot, and send acceptance emails (default command)
    Run(RunArgs),
    /// Classify and print the buckets without writing or sending anything
    Preview(PreviewArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Read a CSV export of the worksheet instead of the live sheet
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Override the snapshot output path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write emails as .eml files into this directory instead of using SMTP
    #[arg(long)]
    outbox: Option<PathBuf>,
    /// Classify and write the snapshot only
    #[arg(long)]
    skip_email: bool,
    /// Email the administrator a report of invalid records
    #[arg(long)]
    send_error_report: bool,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Read a CSV export of the worksheet instead of the live sheet
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(RunArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match command {
        Command::Run(args) => run_triage(config, args),
        Command::Preview(args) => run_preview(config, args),
    }
}

fn run_triage(mut config: AppConfig, args: RunArgs) -> Result<(), AppError> {
    apply_run_overrides(&mut config, &args);
    let delivery = build_delivery(&config, &args)?;
    let source = build_source(&config, args.csv)?;

    info!(?config.environment, "starting roster triage");
    let service = TriageService::new(source, config.rules.clone(), delivery);
    let summary = service.run(&config.output_path)?;
    render_summary(&summary);

    Ok(())
}

fn apply_run_overrides(config: &mut AppConfig, args: &RunArgs) {
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }
    if args.send_error_report {
        config.error_report.enabled = true;
    }
}

/// Mail settings are resolved before the roster is touched so a bad setup fails fast.
fn build_delivery(config: &AppConfig, args: &RunArgs) -> Result<Delivery, AppError> {
    if args.skip_email {
        return Ok(Delivery::default());
    }

    let error_report_recipient = if config.error_report.enabled {
        Some(config.error_report.recipient()?.to_string())
    } else {
        None
    };

    let transport: Box<dyn MailTransport> = match &args.outbox {
        Some(dir) => Box::new(OutboxMailer::new(dir.clone())?),
        None => Box::new(SmtpMailer::starttls(
            &config.mail.smtp_host,
            config.mail.smtp_port,
            config.mail.sender()?,
            config.mail.password()?,
        )?),
    };
    let template = load_template(&config.mail.template_path)?;
    let notifier = Notifier::new(
        transport,
        config.mail.sender()?,
        config.mail.subject.clone(),
        template,
        config.columns.clone(),
    )?;

    Ok(Delivery {
        notifier: Some(notifier),
        error_report_recipient,
    })
}

fn run_preview(config: AppConfig, args: PreviewArgs) -> Result<(), AppError> {
    let source = build_source(&config, args.csv)?;
    let description = source.describe();
    let service = TriageService::new(source, config.rules.clone(), Delivery::default());
    let classification = service.preview()?;

    render_preview(
        &classification,
        &config.columns,
        &description,
        config.rules.gpa_threshold,
    );
    Ok(())
}

fn build_source(
    config: &AppConfig,
    csv: Option<PathBuf>,
) -> Result<Box<dyn RosterSource>, AppError> {
    let source: Box<dyn RosterSource> = match csv {
        Some(path) => Box::new(CsvRosterSource::new(path, config.rules.header_rows)),
        None => {
            let location = SheetLocation {
                spreadsheet_title: config.sheet.spreadsheet_title.clone(),
                spreadsheet_id: config.sheet.spreadsheet_id.clone(),
                worksheet_title: config.sheet.worksheet_title.clone(),
                header_rows: config.rules.header_rows,
            };
            Box::new(GoogleSheetsClient::connect(
                &config.sheet.service_account_key,
                location,
            )?)
        }
    };
    Ok(source)
}

fn render_summary(summary: &TriageSummary) {
    let counts = &summary.counts;
    println!("Roster triage complete");
    println!(
        "Qualified: {} | Unqualified: {} | Invalid: {} | Already reviewed: {}",
        counts.qualified, counts.unqualified, counts.invalid, counts.skipped_reviewed
    );
    println!("Snapshot: {}", summary.snapshot_path.display());
    println!("Acceptance emails sent: {}", summary.notices.len());
    if summary.error_report_sent {
        println!("Error report sent to administrator");
    }
}

fn render_preview(
    classification: &Classification,
    columns: &ContactColumns,
    source: &str,
    threshold: f64,
) {
    println!("Roster triage preview");
    println!("Source: {source} (qualifying GPA >= {threshold:.2})");

    println!("\nQualified ({})", classification.qualified.len());
    for entry in &classification.qualified {
        println!(
            "- row {}: {} <{}> GPA {:.2}",
            entry.row,
            entry.record.trimmed(&columns.name),
            entry.record.trimmed(&columns.email),
            entry.gpa
        );
    }

    println!("\nUnqualified ({})", classification.unqualified.len());
    for entry in &classification.unqualified {
        println!(
            "- row {}: {} GPA {:.2}",
            entry.row,
            entry.record.trimmed(&columns.name),
            entry.gpa
        );
    }

    if classification.invalid.is_empty() {
        println!("\nInvalid: none");
    } else {
        println!("\nInvalid ({})", classification.invalid.len());
        for entry in &classification.invalid {
            println!(
                "- row {}: {}: {}",
                entry.row,
                entry.record.trimmed(&columns.name),
                entry.error
            );
        }
    }

    println!(
        "\nAlready reviewed (skipped): {}",
        classification.skipped_reviewed
    );
}
