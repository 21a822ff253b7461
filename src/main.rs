mod cli;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::ValueEnum;
use log::info;
use rusty_charts::assemble_filtered;
use rusty_charts::chart::ChartStyle;
use rusty_charts::chart::Palette;
use rusty_charts::config::load_style;
use rusty_charts::document::SheetFilter;
use rusty_charts::open_workbook;
use rusty_charts::render::Paginator;
use rusty_charts::render::PdfPaginator;
use rusty_charts::render::PlanWriter;
use rusty_charts::sheet_names;

fn main() {
    env_logger::init();

    let args = cli::CliArgs::parse();
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &cli::CliArgs) -> Result<()> {
    if args.list_palettes {
        print_palettes();
        return Ok(());
    }

    let input = args.input.as_deref().context("No input workbook given")?;
    if args.list_sheets {
        for name in sheet_names(input)? {
            println!("{}", name);
        }
        return Ok(());
    }

    let style = match &args.style {
        Some(path) => load_style(path)?,
        None => ChartStyle::default(),
    };
    let filter = SheetFilter::new(&args.sheets).context("Invalid --sheet pattern")?;

    let workbook = open_workbook(input).with_context(|| format!("Failed to read '{}'", input.display()))?;
    info!("read {} sheets from '{}'", workbook.len(), input.display());

    let document = assemble_filtered(&workbook, args.palette, &style, &filter);
    if let Some(plan) = &args.plan {
        PlanWriter.write_to(&document, plan)?;
    }
    PdfPaginator::new(style).write_to(&document, &args.output)?;

    println!(
        "Wrote {} ({} chart pages, {} error pages)",
        args.output.display(),
        document.chart_count(),
        document.error_count(),
    );
    Ok(())
}

fn print_palettes() {
    for palette in Palette::all() {
        let name = palette
            .to_possible_value()
            .map(|value| value.get_name().to_owned())
            .unwrap_or_default();
        let colors: Vec<String> = palette.colors().iter().map(|color| color.to_string()).collect();
        println!("{:<16} {:<22} {}", name, palette.display_name(), colors.join(" "));
    }
}
