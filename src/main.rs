use cardledger::application::auth::TokenService;
use cardledger::application::directory::UserDirectory;
use cardledger::application::engine::CardEngine;
use cardledger::domain::ports::{
    CardStoreHandle, ClockHandle, SystemClock, UserStoreHandle,
};
use cardledger::domain::user::{Identity, Role};
use cardledger::error::LedgerError;
use cardledger::infrastructure::in_memory::{InMemoryCardStore, InMemoryUserStore};
use cardledger::interfaces::csv::card_writer::CardWriter;
use cardledger::interfaces::csv::op_reader::{OpKind, Operation, OperationReader};
use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// After processing, issue a signed token for this user. Requires the
    /// CARDLEDGER_TOKEN_SECRET environment variable.
    #[arg(long)]
    token_for: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let clock: ClockHandle = Arc::new(SystemClock);

    let (cards, users) = open_stores(cli.db_path)?;
    let directory = UserDirectory::new(users.clone());
    let engine = CardEngine::new(cards.clone(), users.clone(), clock.clone());

    // Process operations, reporting row-level failures without aborting.
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for op_result in reader.operations() {
        match op_result {
            Ok(op) => {
                if let Err(e) = apply(&directory, &engine, &op).await {
                    eprintln!("Error processing operation: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {}", e);
            }
        }
    }

    // Output the final ledger, sorted by card number for stable output.
    let now = clock.now();
    let mut all = cards.all().await.map_err(|e| miette!("{e}"))?;
    all.sort_by(|a, b| a.number.cmp(&b.number));
    let views = all.iter().map(|card| card.view(now)).collect();

    let stdout = io::stdout();
    let mut writer = CardWriter::new(stdout.lock());
    writer.write_cards(views).map_err(|e| miette!("{e}"))?;

    if let Some(username) = cli.token_for {
        let secret = std::env::var("CARDLEDGER_TOKEN_SECRET")
            .map_err(|_| miette!("CARDLEDGER_TOKEN_SECRET must be set to issue tokens"))?;
        let tokens = TokenService::new(secret.as_bytes(), users, clock);
        let username = cardledger::domain::user::Username::new(username.as_str())
            .map_err(|e| miette!("{e}"))?;
        let user = directory.get(&username).await.map_err(|e| miette!("{e}"))?;
        let token = tokens.issue(&user).map_err(|e| miette!("{e}"))?;
        println!("{token}");
    }

    Ok(())
}

fn open_stores(db_path: Option<PathBuf>) -> Result<(CardStoreHandle, UserStoreHandle)> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store =
                cardledger::infrastructure::rocksdb::RocksDbStore::open(path)
                    .map_err(|e| miette!("{e}"))?;
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => Err(miette!(
            "persistent storage requires the 'storage-rocksdb' feature"
        )),
        None => Ok((
            Arc::new(InMemoryCardStore::new()),
            Arc::new(InMemoryUserStore::new()),
        )),
    }
}

async fn apply(
    directory: &UserDirectory,
    engine: &CardEngine,
    op: &Operation,
) -> cardledger::error::Result<()> {
    let missing = |field: &str| LedgerError::Validation(format!("{field} column is required"));

    if op.op == OpKind::Register {
        let password = op.password.as_deref().ok_or_else(|| missing("password"))?;
        let role = Role::from_str(op.role.as_deref().ok_or_else(|| missing("role"))?)?;
        directory.register(&op.user, password, role).await?;
        return Ok(());
    }

    // Every other op acts as the named, already-registered user.
    let username = cardledger::domain::user::Username::new(op.user.as_str())?;
    let identity = Identity::from(&directory.get(&username).await?);
    let number = || op.number.as_deref().ok_or_else(|| missing("number"));

    match op.op {
        OpKind::Register => unreachable!("handled above"),
        OpKind::Card => {
            let holder = op.holder.as_deref().ok_or_else(|| missing("holder"))?;
            let validity = op.validity.as_deref().ok_or_else(|| missing("validity"))?;
            engine
                .create_card(number()?, holder, validity, &identity)
                .await?;
        }
        OpKind::Block => {
            engine.block_card(number()?, &identity).await?;
        }
        OpKind::Activate => {
            engine.activate_card(number()?, &identity).await?;
        }
        OpKind::Delete => {
            engine.delete_card(number()?, &identity).await?;
        }
        OpKind::Transfer => {
            let to = op.to_number.as_deref().ok_or_else(|| missing("to_number"))?;
            let amount = op.amount.ok_or_else(|| missing("amount"))?;
            engine.transfer(number()?, to, amount, &identity).await?;
        }
    }
    Ok(())
}
