use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;

use lgw_asset::Asset;
use lgw_client::{AssetContract, AssetError, CommitOutcome, Submitted};
use lgw_devnet::{DevNetwork, DevnetConfig, DevnetServer, ServerTls};
use lgw_network::{ConnectionProfile, Gateway, TlsMaterial};
use lgw_types::TransactionId;
use lgw_wallet::{
    ensure_identity, reimport_identity, FileSystemWallet, IdentityStore, MspCredentials, Provisioned,
};

use crate::cli::*;
use crate::config::GatewayConfig;

const STATUS_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let config = || GatewayConfig::load(&cli.config);
    match cli.command {
        Command::Enroll(args) => cmd_enroll(&config()?, args, format),
        Command::InitLedger => {
            let assets = connect(&config()?).await?;
            let done = assets.init_ledger().await.map_err(explain)?;
            print_submitted("Ledger initialized", &done, format);
            Ok(())
        }
        Command::Assets(args) => cmd_assets(&connect(&config()?).await?, args, format).await,
        Command::CommitStatus(args) => {
            cmd_commit_status(&connect(&config()?).await?, args, format).await
        }
        Command::Sample => cmd_sample(&connect(&config()?).await?, format).await,
        Command::Devnet(args) => cmd_devnet(args).await,
    }
}

fn cmd_enroll(config: &GatewayConfig, args: EnrollArgs, format: OutputFormat) -> anyhow::Result<()> {
    let wallet = FileSystemWallet::open(&config.wallet_dir)
        .with_context(|| format!("opening wallet {}", config.wallet_dir.display()))?;
    let Some(msp_dir) = &config.msp_dir else {
        bail!("msp_dir is not set in the configuration file");
    };
    let source = MspCredentials::new(msp_dir);
    let outcome = if args.force {
        reimport_identity(&wallet, &config.label, &config.msp_id, &source)?
    } else {
        ensure_identity(&wallet, &config.label, &config.msp_id, &source)?
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "label": config.label,
                "mspId": config.msp_id,
                "created": outcome == Provisioned::Created,
            })
        ),
        OutputFormat::Text => match outcome {
            Provisioned::Created => println!(
                "{} Stored identity {} ({})",
                "✓".green().bold(),
                config.label.bold(),
                config.msp_id
            ),
            Provisioned::Existing => println!(
                "Identity {} already in the wallet",
                config.label.bold()
            ),
        },
    }
    Ok(())
}

async fn connect(config: &GatewayConfig) -> anyhow::Result<AssetContract> {
    let wallet = FileSystemWallet::open(&config.wallet_dir)
        .with_context(|| format!("opening wallet {}", config.wallet_dir.display()))?;
    if !wallet.exists(&config.label)? {
        bail!(
            "no identity {:?} in the wallet, run `lgw enroll` first",
            config.label
        );
    }
    let identity = wallet.get(&config.label)?;
    let profile = ConnectionProfile::from_file(&config.profile)
        .with_context(|| format!("loading profile {}", config.profile.display()))?;
    let session = Gateway::tcp()
        .connect(&profile, &identity, config.options.clone())
        .await
        .with_context(|| format!("connecting to {}", profile.name))?;
    tracing::info!(
        endpoint = session.endpoint(),
        channel = session.channel(),
        contract = session.contract(),
        "connected"
    );
    Ok(AssetContract::from_session(Arc::new(session)))
}

/// Add the re-query hint to ambiguous failures.
fn explain(err: AssetError) -> anyhow::Error {
    let hint = match &err {
        AssetError::Invoke(e) if e.requires_requery() => e.tx_id().map(|tx| {
            format!("outcome unknown, check it with `lgw commit-status {}`", tx.to_hex())
        }),
        _ => None,
    };
    match hint {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => err.into(),
    }
}

async fn cmd_assets(
    assets: &AssetContract,
    args: AssetsArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match args.action {
        AssetAction::List => {
            let all = assets.list_all().await.map_err(explain)?;
            print_assets(&all, format);
        }
        AssetAction::Read { id } => {
            let asset = assets.read(&id).await.map_err(explain)?;
            print_assets(std::slice::from_ref(&asset), format);
        }
        AssetAction::Exists { id } => {
            let exists = assets.exists(&id).await.map_err(explain)?;
            match format {
                OutputFormat::Json => println!("{}", json!({ "id": id, "exists": exists })),
                OutputFormat::Text => println!("{id}: {exists}"),
            }
        }
        AssetAction::Create(fields) => {
            let done = assets.create(&to_asset(fields)).await.map_err(explain)?;
            print_submitted("Asset created", &done, format);
        }
        AssetAction::Update(fields) => {
            let done = assets.update(&to_asset(fields)).await.map_err(explain)?;
            print_submitted("Asset updated", &done, format);
        }
        AssetAction::Transfer { id, new_owner } => {
            let done = assets.transfer(&id, &new_owner).await.map_err(explain)?;
            print_submitted(
                &format!("Transferred {id} from {} to {new_owner}", done.result_text()),
                &done,
                format,
            );
        }
        AssetAction::Delete { id } => {
            let done = assets.delete(&id).await.map_err(explain)?;
            print_submitted("Asset deleted", &done, format);
        }
    }
    Ok(())
}

async fn cmd_commit_status(
    assets: &AssetContract,
    args: CommitStatusArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let tx_id = TransactionId::from_hex(&args.tx_id).context("parsing transaction id")?;
    let outcome = assets
        .contract()
        .commit_status(&tx_id, STATUS_QUERY_TIMEOUT)
        .await?;
    match format {
        OutputFormat::Json => {
            let body = match outcome {
                CommitOutcome::Committed { block } => json!({ "status": "valid", "block": block }),
                CommitOutcome::Invalid { block, code } => {
                    json!({ "status": "invalid", "block": block, "code": code.as_str() })
                }
                CommitOutcome::Unknown => json!({ "status": "unknown" }),
            };
            println!("{body}");
        }
        OutputFormat::Text => match outcome {
            CommitOutcome::Committed { block } => {
                println!("{} committed in block {block}", "✓".green().bold())
            }
            CommitOutcome::Invalid { block, code } => {
                println!("{} committed as invalid in block {block}: {code}", "✗".red().bold())
            }
            CommitOutcome::Unknown => println!("{}", "not committed (yet)".yellow()),
        },
    }
    Ok(())
}

/// The reference application flow, step by step.
async fn cmd_sample(assets: &AssetContract, format: OutputFormat) -> anyhow::Result<()> {
    step("InitLedger: create the initial set of assets");
    let done = assets.init_ledger().await.map_err(explain)?;
    print_submitted("Ledger initialized", &done, format);

    step("GetAllAssets: return all the current assets on the ledger");
    print_assets(&assets.list_all().await.map_err(explain)?, format);

    step("CreateAsset: create a new asset");
    let created = Asset::new("asset13", "yellow", 5, "Tom", 1300);
    let done = assets.create(&created).await.map_err(explain)?;
    print_submitted("Asset created", &done, format);

    step("ReadAsset: return an asset by id");
    print_assets(&[assets.read("asset13").await.map_err(explain)?], format);

    step("AssetExists: check whether asset1 is on the ledger");
    println!("asset1: {}", assets.exists("asset1").await.map_err(explain)?);

    step("TransferAsset: give asset1 to a new owner");
    let done = assets
        .transfer("asset1", "Christopher")
        .await
        .map_err(explain)?;
    print_submitted(
        &format!("Transferred asset1 from {}", done.result_text()),
        &done,
        format,
    );

    step("ReadAsset: confirm the new owner");
    print_assets(&[assets.read("asset1").await.map_err(explain)?], format);

    step("UpdateAsset: updating an asset that does not exist must fail");
    match assets
        .update(&Asset::new("asset70", "blue", 5, "Tomoko", 300))
        .await
    {
        Ok(_) => bail!("updating a missing asset unexpectedly succeeded"),
        Err(e) => println!("{} {e}", "expected error:".yellow()),
    }
    Ok(())
}

async fn cmd_devnet(args: DevnetArgs) -> anyhow::Result<()> {
    let mut config = match &args.network {
        Some(path) => DevnetConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DevnetConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid bind address {bind:?}"))?;
    }

    let tls = match (&config.tls, args.self_signed) {
        (Some(files), _) => Some(ServerTls::from_config(files)?),
        (None, true) => Some(ServerTls::self_signed(vec![
            "localhost".into(),
            config.bind_addr.ip().to_string(),
        ])?),
        (None, false) => None,
    };
    let bind_addr = config.bind_addr;
    let network = DevNetwork::new(config)?;
    let server = DevnetServer::bind(network.clone(), bind_addr, tls.as_ref()).await?;
    let addr = server.local_addr()?;

    if let Some(out) = &args.profile_out {
        let material = tls
            .as_ref()
            .map(|t| TlsMaterial::from_pem(t.cert_pem()).with_server_name("localhost"));
        let profile = network.connection_profile(addr.to_string(), material);
        std::fs::write(out, serde_json::to_string_pretty(&profile)?)
            .with_context(|| format!("writing {}", out.display()))?;
        println!("Profile written to {}", out.display().to_string().bold());
    }
    println!(
        "{} Development network on {} (channel {}, TLS {})",
        "✓".green().bold(),
        addr.to_string().bold(),
        network.config().channel.yellow(),
        if tls.is_some() { "on" } else { "off" }
    );

    tokio::select! {
        served = server.serve() => served?,
        _ = tokio::signal::ctrl_c() => println!("Shutting down."),
    }
    Ok(())
}

fn to_asset(fields: AssetFields) -> Asset {
    Asset::new(
        fields.id,
        fields.color,
        fields.size,
        fields.owner,
        fields.appraised_value,
    )
}

fn step(title: &str) {
    eprintln!("\n{} {}", "-->".cyan().bold(), title);
}

fn print_submitted(what: &str, done: &Submitted, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "txId": done.tx_id.to_hex(),
                "block": done.block,
                "result": done.result_text(),
            })
        ),
        OutputFormat::Text => {
            println!("{} {}", "✓".green().bold(), what);
            println!("  Transaction: {}", done.tx_id.short_id().yellow());
            println!("  Block: {}", done.block);
        }
    }
}

fn print_assets(assets: &[Asset], format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(assets) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("cannot render assets: {e}"),
        },
        OutputFormat::Text => {
            if assets.is_empty() {
                println!("No assets.");
            }
            for a in assets {
                println!(
                    "{:<10} {:<8} size {:<4} owner {:<12} value {}",
                    a.id.bold(),
                    a.color,
                    a.size,
                    a.owner.cyan(),
                    a.appraised_value
                );
            }
        }
    }
}
