//! Lookup command: print the resolved lookup table

use anyhow::{Context, Result};
use flowtag_common::LookupTable;
use log::info;

use crate::settings::Settings;
use crate::utils::print_header;

/// Load the lookup table and list its entries in key order
pub fn show(settings: &Settings) -> Result<()> {
    let table = LookupTable::load(&settings.lookup, settings.delimiter_byte()?)
        .with_context(|| {
            format!("load stage failed for lookup table {}", settings.lookup.display())
        })?;
    info!("Loaded {} lookup entries", table.len());

    print_header(&format!("Lookup table {}", settings.lookup.display()));
    println!("Port,Protocol,Tag");
    for (key, tag) in table.iter() {
        println!("{},{},{}", key.port(), key.protocol(), tag);
    }
    println!("\n{} entries", table.len());

    Ok(())
}
