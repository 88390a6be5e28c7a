use std::path::PathBuf;

use eyre::Result;
use structopt::StructOpt;

#[derive(StructOpt)]
struct Options {
    /// Trace every canvas call to stdout instead of rendering
    #[structopt(long)]
    trace: bool,

    #[structopt(short)]
    output: Option<PathBuf>,

    input: PathBuf,
}

fn main() -> Result<()> {
    let opts = Options::from_args();

    if opts.trace {
        let src = std::fs::read(&opts.input)?;
        let viewbox = iconvg::decode_viewbox(&src)?;

        let mut canvas = iconvg::DebugCanvas::new(Some(std::io::stdout()), "debug: ", None);
        iconvg::decode(&mut canvas, viewbox, &src, &iconvg::DecodeOptions::default())?;
    } else {
        iconvg::render_helper::render(opts.input, opts.output)?;
    }

    Ok(())
}
