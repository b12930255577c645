//! Offline parsing of captured command output.

use std::io::Read as _;
use std::path::Path;
use std::time::Instant;

use hostpulse_core::monitoring::{
    IdentitySeed, RateCalculator, TransportKind, normalize_distro, parser_for,
};

use crate::error::CliError;

/// Parse command handler
pub fn cmd_parse(transport: TransportKind, file: &Path, host: &str) -> Result<(), CliError> {
    let text = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };

    let json = parse_to_json(transport, &text, host)?;
    println!("{json}");
    Ok(())
}

/// Parses one capture into a pretty-printed snapshot
fn parse_to_json(transport: TransportKind, text: &str, host: &str) -> Result<String, CliError> {
    let mut seed = IdentitySeed::for_host(host);
    if transport == TransportKind::Direct {
        // a direct capture may carry the identity probe output as well
        seed.distro = normalize_distro(text, &seed.distro);
    }

    let raw = parser_for(transport).parse(text, &seed);
    let mut rates = RateCalculator::new();
    let cpu = rates.cpu_load(raw.cpu);
    let network = rates.network_rates(raw.network, Instant::now());
    let snapshot = raw.into_snapshot(cpu, network);

    serde_json::to_string_pretty(&snapshot).map_err(|e| CliError::Output(e.to_string()))
}
