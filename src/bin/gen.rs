#[cfg(feature = "cli")]
mod real {
    use anyhow::{Context, Result};
    use clap::{Parser, ValueEnum};
    use parsegen::diag::Diagnostics;
    use parsegen::{lex, lr};
    use std::io::Write;
    use std::path::PathBuf;

    #[derive(Clone, Copy, Debug, ValueEnum)]
    enum Mode {
        /// Generate a lexer
        Lex,
        /// Generate an LR parser
        Lr,
    }

    #[derive(Parser)]
    #[command(about = "Generate lexer and LR parser code from declarative descriptions")]
    struct Args {
        /// What to generate
        #[arg(value_enum)]
        mode: Mode,

        /// Path to the input description file
        infile: PathBuf,

        /// Output path; `-` writes to stdout
        #[arg(short = 'o', long, default_value = "-")]
        output: String,

        /// Log generator internals while running
        #[arg(short = 'v', long)]
        verbose: bool,
    }

    pub fn main() -> Result<()> {
        let args = match Args::try_parse() {
            Ok(args) => args,
            Err(err) => {
                // Usage problems exit 1, the same as processing errors.
                let _ = err.print();
                std::process::exit(if err.use_stderr() { 1 } else { 0 });
            }
        };

        env_logger::Builder::new()
            .filter_level(if args.verbose {
                log::LevelFilter::Trace
            } else {
                log::LevelFilter::Warn
            })
            .parse_default_env()
            .init();

        let src = std::fs::read_to_string(&args.infile)
            .with_context(|| format!("reading {}", args.infile.display()))?;
        let module = args
            .infile
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_owned());

        let mut diags = Diagnostics::new();
        let result = match args.mode {
            Mode::Lex => lex::generate(&src, &module),
            Mode::Lr => lr::generate(&src, &module, &mut diags),
        };
        diags.report();
        let code = result?;

        if args.output == "-" {
            std::io::stdout().write_all(code.as_bytes())?;
        } else {
            std::fs::write(&args.output, &code)
                .with_context(|| format!("writing {}", args.output))?;
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("gen disabled (compiled without `cli` feature)");
}
