//! `core show translation` command handler
//!
//! Renders the translation cost matrix, triggers recalculation, and lists
//! per-codec translation paths. The host shell parses words up to
//! `core show translation`; everything after lands in `args` here.

use crate::format::Format;
use crate::registry::{TranslatorRegistry, MAX_RECALC};
use std::io::{self, Write};

/// Host CLI return conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliStatus {
    Success,
    Failure,
    ShowUsage,
}

/// Usage text for the command.
pub const USAGE: &str = concat!(
    "Usage: 'core show translation' can be used in two ways.\n",
    "       1. 'core show translation [recalc [<recalc seconds>]]\n",
    "          Displays known codec translators and the cost associated\n",
    "          with each conversion. If the argument 'recalc' is supplied along\n",
    "          with optional number of seconds to test a new test will be performed\n",
    "          as the chart is being displayed.\n",
    "       2. 'core show translation paths [codec]'\n",
    "          This will display all the translation paths associated with a codec\n",
);

/// Handle `core show translation [recalc [N] | paths <codec>]`.
pub fn show_translation(
    registry: &TranslatorRegistry,
    args: &[&str],
    out: &mut dyn Write,
) -> io::Result<CliStatus> {
    if args.len() > 2 {
        return Ok(CliStatus::ShowUsage);
    }

    match args {
        [first, codec] if first.eq_ignore_ascii_case("paths") => {
            return show_paths(registry, codec, out)
        }
        [first, ..] if first.eq_ignore_ascii_case("recalc") => {
            let mut seconds: i64 = args
                .get(1)
                .map(|s| s.parse().unwrap_or(0))
                .unwrap_or(1);
            if seconds <= 0 {
                writeln!(out, "         Recalc must be greater than 0.  Defaulting to 1.")?;
                seconds = 1;
            }
            if seconds > MAX_RECALC as i64 {
                writeln!(
                    out,
                    "         Maximum limit of recalc exceeded by {}, truncating value to {}",
                    seconds - MAX_RECALC as i64,
                    MAX_RECALC
                )?;
                seconds = MAX_RECALC as i64;
            }
            writeln!(
                out,
                "         Recalculating Codec Translation (number of sample seconds: {})\n",
                seconds
            )?;
            registry.recalc(seconds as u32);
        }
        [] => {}
        _ => return Ok(CliStatus::ShowUsage),
    }

    show_matrix(registry, out)?;
    Ok(CliStatus::Success)
}

/// Print the square cost matrix between audio formats.
fn show_matrix(registry: &TranslatorRegistry, out: &mut dyn Write) -> io::Result<()> {
    let costs = registry.cost_table();
    let audio: Vec<Format> = Format::ALL.iter().copied().filter(|f| f.is_audio()).collect();

    writeln!(
        out,
        "         Translation times between formats (in microseconds) for one second of data"
    )?;
    writeln!(out, "          Source Format (Rows) Destination Format (Columns)\n")?;

    // Left column tracks the longest codec name; each other column tracks
    // its own name and the widest cost appearing in it, floor 5.
    let longest = audio.iter().map(|f| f.name().len()).max().unwrap_or(0);
    let col_width = |dst: &Format| -> usize {
        let widest_cost = audio
            .iter()
            .filter_map(|src| costs[src.index()][dst.index()])
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(0);
        dst.name().len().max(widest_cost).max(5)
    };

    // Header row.
    let mut line = format!(" {:longest$}", "");
    for dst in &audio {
        let w = col_width(dst);
        line.push_str(&format!(" {:>w$}", dst.name()));
    }
    writeln!(out, "{}", line)?;

    for src in &audio {
        let mut line = format!(" {:>longest$}", src.name());
        for dst in &audio {
            let w = col_width(dst);
            match costs[src.index()][dst.index()] {
                Some(cost) => line.push_str(&format!(" {:>w$}", cost)),
                None => line.push_str(&format!(" {:>w$}", "-")),
            }
        }
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Print one line per audio codec showing the chain from `codec` or the
/// absence of one.
fn show_paths(
    registry: &TranslatorRegistry,
    codec: &str,
    out: &mut dyn Write,
) -> io::Result<CliStatus> {
    let src = Format::from_name(codec).filter(|f| f.is_audio());
    let Some(src) = src else {
        writeln!(out, "Source codec \"{}\" is not found.", codec)?;
        return Ok(CliStatus::Failure);
    };

    writeln!(
        out,
        "--- Translation paths SRC Codec \"{}\" sample rate {} ---",
        codec,
        src.sample_rate()
    )?;
    for dst in Format::ALL.iter().copied().filter(|f| f.is_audio()) {
        if dst == src {
            continue;
        }
        let desc = registry
            .path_description(dst, src)
            .unwrap_or_else(|| "No Translation Path".to_string());
        writeln!(
            out,
            "\t{:<10.10} To {:<10.10}: {:<60.60}",
            src.name(),
            dst.name(),
            desc
        )?;
    }
    Ok(CliStatus::Success)
}
