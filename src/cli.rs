use clap::Parser;
use rusty_charts::chart::Palette;
use rusty_charts::render::OUTPUT_FILE_NAME;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "rusty-charts")]
#[command(about = "Render every numeric column of an Excel workbook as a bar chart page of one PDF")]
#[command(version)]
pub struct CliArgs {
    /// Workbook to read (.xlsx, .xlsm, .xlam, .xls, .xla)
    #[arg(value_name = "INPUT", required_unless_present = "list_palettes")]
    pub input: Option<PathBuf>,

    /// Where to write the PDF
    #[arg(long, short = 'o', value_name = "PATH", default_value = OUTPUT_FILE_NAME)]
    pub output: PathBuf,

    /// Bar color palette
    #[arg(long, short = 'p', value_enum, default_value_t = Palette::BlueGrey)]
    pub palette: Palette,

    /// Only chart sheets whose name matches one of these glob patterns
    #[arg(long = "sheet", short = 's', value_name = "GLOB")]
    pub sheets: Vec<String>,

    /// Also write the chart plan as JSON
    #[arg(long, value_name = "PATH")]
    pub plan: Option<PathBuf>,

    /// TOML file overriding chart style values
    #[arg(long, value_name = "PATH")]
    pub style: Option<PathBuf>,

    /// Print the sheet names of INPUT and exit
    #[arg(long)]
    pub list_sheets: bool,

    /// Print the available palettes and exit
    #[arg(long)]
    pub list_palettes: bool,
}

impl CliArgs {
    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.list_sheets && self.list_palettes {
            return Err("Cannot specify both --list-sheets and --list-palettes".to_string());
        }
        if self.plan.as_ref().is_some_and(|plan| *plan == self.output) {
            return Err(format!(
                "--plan and --output both point at '{}'",
                self.output.display()
            ));
        }
        Ok(())
    }
}
