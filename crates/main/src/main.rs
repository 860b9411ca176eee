use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use diagram_appendix::AppendixConfig;

/// Builds `appendix.pdf` in the current directory from a folder of feature diagrams.
///
/// Every subfolder of FOLDER_PATH is one feature, named like `System Feature 3: Upload`; its
/// `*.png` files become the feature's diagrams.  Fonts are looked up in `APPENDIX_FONTS_DIR`,
/// `assets/fonts` and the system Liberation Sans directories.
#[derive(Parser)]
#[command(author, version, about = "Generate a PDF appendix of feature diagrams")]
struct Cli {
    /// The path to the folder containing the feature folders.
    folder_path: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = AppendixConfig::default();
    match diagram_appendix::generate(&cli.folder_path, &config) {
        Ok(generated) => println!(
            "Generated {} ({} bytes)",
            generated.output_path.display(),
            generated.bytes_written
        ),
        Err(err) => {
            eprintln!("Error: {}", err);
            print_error_sources(&err);
            std::process::exit(1);
        }
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
