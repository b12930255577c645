//! Remote command listing.

use hostpulse_core::monitoring::TransportKind;
use hostpulse_core::monitoring::commands::{IDENTITY_COMMAND, tick_commands};

/// Commands command handler
pub fn cmd_commands(transport: TransportKind) {
    println!("Transport: {transport}");
    if transport == TransportKind::Direct {
        println!("\nOnce per connection:\n  {IDENTITY_COMMAND}");
    }
    println!("\nEvery poll:");
    for (i, command) in tick_commands(transport).iter().enumerate() {
        println!("  {}. {command}", i + 1);
    }
}
