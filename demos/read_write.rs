//! Example: Reading and writing PLC devices
//!
//! Run with: cargo run --example read_write -- 192.168.3.39 5000 UDP
//!
//! This example demonstrates:
//! - Client configuration and transport mode parsing
//! - Word reads with absent-slot handling
//! - Single word writes
//! - Telling transport failures apart from PLC end codes

use melsec_mc::{Client, ClientConfig, McError, Mode};
use std::time::Duration;

fn main() -> melsec_mc::Result<()> {
    // =========================================================================
    // Connect to PLC
    // =========================================================================

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "192.168.3.39".to_string());
    let port = args
        .next()
        .and_then(|port| port.parse().ok())
        .unwrap_or(5000);
    let mode: Mode = args.next().as_deref().unwrap_or("UDP").parse()?;

    let config = ClientConfig::new(host, port)
        .with_mode(mode)
        .with_timeout(Duration::from_secs(3));
    println!("Connecting: {:?}", config);

    let mut client = Client::new(config)?;

    // =========================================================================
    // Reading Words
    // =========================================================================

    println!("\n=== Reading Words ===\n");

    let words = client.read("D*000100", 4)?;
    for (offset, word) in words.iter().enumerate() {
        match word {
            Some(value) => println!("D{} = {} (0x{:04X})", 100 + offset, value, value),
            None => println!("D{} = <no data>", 100 + offset),
        }
    }

    // =========================================================================
    // Writing Words
    // =========================================================================

    println!("\n=== Writing Words ===\n");

    client.write("D*000200", 0x1234)?;
    println!("D200 <- 0x1234");

    // Values must fit in one word; this is rejected before anything is sent.
    if let Err(e) = client.write("D*000200", 70_000) {
        println!("Rejected: {}", e);
    }

    // =========================================================================
    // Error Handling
    // =========================================================================

    println!("\n=== Error Handling ===\n");

    match client.read_word("ZZ*999999") {
        Ok(word) => println!("ZZ999999 = {:?}", word),
        Err(McError::EndCode { code }) => println!("PLC end code {}", code),
        Err(e) if e.is_transport() => println!("Communication failure: {}", e),
        Err(e) => println!("Error: {}", e),
    }

    client.close()?;
    println!("\nConnection closed");

    Ok(())
}
