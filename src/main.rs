use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use promptpay::application::service::{DEFAULT_TTL, PromptPayService, unix_now};
use promptpay::config::{EncoderConfig, THAILAND_COUNTRY_CODE, THB_CURRENCY_CODE};
use promptpay::domain::payload::{PromptPayEncoder, decode};
use promptpay::domain::recipient::IdentifierLayout;
use promptpay::infrastructure::in_memory::InMemoryPaymentRequestStore;
use promptpay::interfaces::csv::payment_writer::PaymentWriter;
use promptpay::interfaces::csv::request_reader::RequestReader;
use promptpay::logging::setup_logging;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// How recipient identifiers are laid out in the merchant account field
    #[arg(long, value_enum, global = true, default_value_t = IdentifierLayout::Standard)]
    layout: IdentifierLayout,

    /// ISO 4217 numeric currency code
    #[arg(long, global = true, default_value = THB_CURRENCY_CODE)]
    currency: String,

    /// ISO 3166-1 alpha-2 country code
    #[arg(long, global = true, default_value = THAILAND_COUNTRY_CODE)]
    country: String,
}

#[derive(Subcommand)]
enum Command {
    /// Print the QR payload for a single payment
    Encode {
        /// Mobile number, national ID, tax ID or e-wallet ID
        recipient: String,

        /// Amount in major units. Omit for a static QR code.
        #[arg(long)]
        amount: Option<String>,

        /// Reference label carried in the additional data field
        #[arg(long)]
        reference: Option<String>,
    },
    /// Verify a payload's checksum and print its fields as JSON
    Decode { payload: String },
    /// Issue every row of a `recipient,amount,reference` CSV file
    Batch {
        input: PathBuf,

        /// Seconds before an issued request expires
        #[arg(long, default_value_t = DEFAULT_TTL.as_secs())]
        ttl_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let encoder = PromptPayEncoder::new(EncoderConfig {
        currency_code: cli.currency,
        country_code: cli.country,
        layout: cli.layout,
        ..Default::default()
    })
    .into_diagnostic()?;

    match cli.command {
        Command::Encode {
            recipient,
            amount,
            reference,
        } => {
            let payload = encoder
                .prepare(&recipient, amount.as_deref(), reference.as_deref())
                .into_diagnostic()?;
            println!("{}", encoder.encode_payload(&payload).into_diagnostic()?);
        }
        Command::Decode { payload } => {
            let decoded = decode(&payload).into_diagnostic()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&decoded).into_diagnostic()?
            );
        }
        Command::Batch { input, ttl_secs } => {
            let service = PromptPayService::new(
                encoder,
                Box::new(InMemoryPaymentRequestStore::new()),
                Duration::from_secs(ttl_secs),
            );

            let file = File::open(input).into_diagnostic()?;
            let now = unix_now();
            let mut issued = Vec::new();
            for row in RequestReader::new(file).requests() {
                match row {
                    Ok(row) => {
                        match service
                            .issue(&row.recipient, &row.amount, &row.reference, now)
                            .await
                        {
                            Ok(request) => issued.push(request),
                            Err(e) => {
                                warn!(reference = %row.reference, error = %e, "Error issuing payment request")
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "Error reading payment request"),
                }
            }

            let stdout = io::stdout();
            let mut writer = PaymentWriter::new(stdout.lock());
            writer.write_requests(issued).into_diagnostic()?;
        }
    }

    Ok(())
}
