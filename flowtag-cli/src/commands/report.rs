//! Report command: load, classify, write

use anyhow::{Context, Result};
use flowtag_common::{classify, report, LookupTable};
use log::{info, warn};

use crate::settings::Settings;
use crate::utils::Timer;

/// Run the whole pipeline.
///
/// The report file is only created once the lookup table and the flow log
/// have both been processed, so a failed run leaves no report behind.
pub fn run(settings: &Settings) -> Result<()> {
    let format = settings.report_format()?;
    let delimiter = settings.delimiter_byte()?;

    let table = {
        let _timer = Timer::new("load");
        LookupTable::load(&settings.lookup, delimiter).with_context(|| {
            format!("load stage failed for lookup table {}", settings.lookup.display())
        })?
    };
    info!("Loaded {} lookup entries", table.len());
    if table.is_empty() {
        warn!("Lookup table is empty, every flow record will be untagged");
    }

    let aggregates = {
        let _timer = Timer::new("classify");
        classify::classify_path(&settings.flows, &table).with_context(|| {
            format!("classify stage failed for flow log {}", settings.flows.display())
        })?
    };
    info!(
        "Classified {} records ({} tagged, {} untagged), skipped {} malformed lines",
        aggregates.classified(),
        aggregates.tagged(),
        aggregates.untagged_count,
        aggregates.stats.lines_skipped
    );

    {
        let _timer = Timer::new("report");
        report::write_report_to_path(&aggregates, format, &settings.output).with_context(|| {
            format!("report stage failed for {}", settings.output.display())
        })?;
    }

    println!("Report written to {}", settings.output.display());
    Ok(())
}
