//! `devjit visible-devices`: parse an accelerator allow-list.

use anyhow::Result;
use devjit_platform::parse_visible_device_list;

pub fn run(list: &str) -> Result<()> {
    println!("{}", render(list)?);
    Ok(())
}

pub fn render(list: &str) -> Result<String> {
    Ok(match parse_visible_device_list(list)? {
        None => "all devices visible".to_string(),
        Some(ordinals) => {
            let ordinals: Vec<String> = ordinals.iter().map(i32::to_string).collect();
            format!("visible devices: {}", ordinals.join(", "))
        }
    })
}
