mod config;
mod deployment;
mod error;
mod version;
mod wallet;

use std::env;
use std::path::PathBuf;
use std::process::exit;

use anyhow::{anyhow, Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use config::{
    ChainConfig, CollectorKind, DepGroupConfig, DeployConfig, DeployMethod, DEFAULT_CKB_RPC_URL,
    DEFAULT_DEP_GROUP_FILE, DEFAULT_INDEXER_URL,
};
use deployment::assembly::{DEPLOY_FEE_RATE, DEP_GROUP_FEE_RATE};
use deployment::manage;
use version::version_string;

/// Flags shared by both subcommands, `indexer_flag` is the long name of the indexer url
fn chain_args<'a>(indexer_flag: &'a str, default_fee_rate: &'a str) -> Vec<Arg<'a, 'a>> {
    vec![
        Arg::with_name("url")
            .long("url")
            .short("u")
            .help("CKB RPC url")
            .default_value(DEFAULT_CKB_RPC_URL)
            .takes_value(true),
        Arg::with_name("indexer-url")
            .long(indexer_flag)
            .short("i")
            .help("CKB indexer RPC url")
            .default_value(DEFAULT_INDEXER_URL)
            .takes_value(true),
        Arg::with_name("key")
            .long("key")
            .short("k")
            .help("Private key in hex, owner of the funding cells")
            .required(true)
            .takes_value(true),
        Arg::with_name("fee-rate")
            .long("fee-rate")
            .help("Fee rate in shannons per KB")
            .default_value(default_fee_rate)
            .takes_value(true),
        Arg::with_name("collector")
            .long("collector")
            .help("How live cells are collected")
            .possible_values(&["indexer", "scan"])
            .default_value("indexer")
            .takes_value(true),
        Arg::with_name("dry-run")
            .long("dry-run")
            .help("Print the signed transaction instead of sending it"),
    ]
}

fn chain_config(args: &ArgMatches) -> Result<ChainConfig> {
    let fee_rate: u64 = args
        .value_of("fee-rate")
        .expect("fee rate")
        .parse()
        .context("parse fee rate")?;
    let collector: CollectorKind = args.value_of("collector").expect("collector").parse()?;
    Ok(ChainConfig {
        rpc_url: args.value_of("url").expect("url").to_string(),
        indexer_url: args.value_of("indexer-url").expect("indexer url").to_string(),
        collector,
        key: args.value_of("key").expect("key").to_string(),
        fee_rate,
        dry_run: args.is_present("dry-run"),
    })
}

fn build_app<'a>(
    version: &'a str,
    deploy_fee_rate: &'a str,
    dep_group_fee_rate: &'a str,
) -> App<'a, 'a> {
    App::new("ckb-script-deployer")
        .setting(AppSettings::ArgRequiredElseHelp)
        .version(version)
        .about("Deploy scripts and dep groups to CKB")
        .subcommand(
            SubCommand::with_name("deploy")
                .about("Deploy a script binary, optionally guarded by a type id")
                .args(&chain_args("indexerUrl", deploy_fee_rate))
                .args(&[
                    Arg::with_name("binary")
                        .long("binary")
                        .short("b")
                        .help("Path of the compiled script")
                        .required(true)
                        .takes_value(true),
                    Arg::with_name("method")
                        .long("method")
                        .short("m")
                        .help("\"typeID\" deploys with a type id, anything else deploys as data")
                        .takes_value(true),
                ])
                .display_order(0),
        )
        .subcommand(
            SubCommand::with_name("dep_group")
                .about("Create a dep group cell of deployed cells")
                .args(&chain_args("indexUrl", dep_group_fee_rate))
                .arg(
                    Arg::with_name("file")
                        .long("file")
                        .short("f")
                        .help("Yaml list of {txHash, index} out-points, an empty list is rejected")
                        .default_value(DEFAULT_DEP_GROUP_FILE)
                        .takes_value(true),
                )
                .display_order(1),
        )
}

fn run_cli() -> Result<()> {
    env_logger::init();

    let version = version_string();
    let deploy_fee_rate = DEPLOY_FEE_RATE.to_string();
    let dep_group_fee_rate = DEP_GROUP_FEE_RATE.to_string();

    let mut app = build_app(&version, &deploy_fee_rate, &dep_group_fee_rate);

    let help_str = {
        let mut buf = Vec::new();
        app.write_long_help(&mut buf)?;
        String::from_utf8(buf)?
    };

    let matches = app.get_matches();
    let receipt = match matches.subcommand() {
        ("deploy", Some(args)) => {
            let config = DeployConfig {
                chain: chain_config(args)?,
                binary: PathBuf::from(args.value_of("binary").expect("binary")),
                method: DeployMethod::parse(args.value_of("method").unwrap_or_default()),
            };
            manage::deploy(config)?
        }
        ("dep_group", Some(args)) => {
            let config = DepGroupConfig {
                chain: chain_config(args)?,
                file: PathBuf::from(args.value_of("file").expect("file")),
            };
            manage::dep_group(config)?
        }
        (command, _) => {
            eprintln!("{}", help_str);
            return Err(anyhow!("unrecognize command '{}'", command));
        }
    };
    if !receipt.sent {
        println!("Dry run, transaction not sent");
    }
    print!("{}", receipt);
    Ok(())
}

fn main() {
    let backtrace_level = env::var("RUST_BACKTRACE").unwrap_or_default();
    let enable_backtrace = !backtrace_level.is_empty() && backtrace_level != "0";
    match run_cli() {
        Ok(_) => {}
        Err(err) if enable_backtrace => {
            eprintln!("error: {:?}", err);
            exit(1);
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            exit(1);
        }
    }
}
