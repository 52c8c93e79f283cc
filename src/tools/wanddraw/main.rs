// SPDX-License-Identifier: GPL-3.0-or-later
mod args;
mod style;

use anyhow::Result;
use args::{ImageSize, PointList, Segment, TextArg};
use std::{io, path::Path, process::ExitCode};
use style::Style;
use tracing::{info, Level};
use wand::{Color, Drawing, FontMetrics, Image, Library};

struct Shapes {
    lines: Vec<Segment>,
    rects: Vec<Segment>,
    circles: Vec<Segment>,
    polygons: Vec<PointList>,
    polylines: Vec<PointList>,
    texts: Vec<TextArg>,
}

enum Canvas {
    Open(String),
    New(ImageSize, Option<String>),
    None,
}

fn main() -> ExitCode {
    ExitCode::from(wanddraw_main())
}

fn wanddraw_main() -> u8 {
    let flags = xflags::parse_or_exit! {
        /// Displays version information and exits.
        optional -v,--version
        /// Print extra debugging information.
        optional -V,--verbose
        /// Input image to draw on. Mutually exclusive with -s/--size.
        optional -i,--input input: String
        /// Size of a new canvas, given as WIDTHxHEIGHT. Mutually exclusive
        /// with -i/--input.
        optional -s,--size size: ImageSize
        /// Background color of a new canvas, either #rrggbb[aa] or any color
        /// name ImageMagick understands. Defaults to white.
        optional -b,--background background: String
        /// TOML file with fill, stroke and text settings applied before
        /// anything is drawn.
        optional --style style: String
        /// Output image file. The format is guessed from the extension.
        optional -o,--out out: String
        /// Line from x1,y1 to x2,y2. Can be repeated.
        repeated --line line: Segment
        /// Rectangle given as left,top,right,bottom. Can be repeated.
        repeated --rect rect: Segment
        /// Circle given as origin x,y and a perimeter point x,y. Can be
        /// repeated.
        repeated --circle circle: Segment
        /// Closed polygon given as "x,y x,y ...". Can be repeated.
        repeated --polygon polygon: PointList
        /// Open polyline given as "x,y x,y ...". Can be repeated.
        repeated --polyline polyline: PointList
        /// Text given as x,y,body. Drawn after all other shapes. Can be
        /// repeated.
        repeated --text text: TextArg
        /// Print the font metrics of the given text with the configured
        /// style.
        optional --metrics metrics: String
        /// Print the accumulated drawing as <drawing-wand> XML.
        optional --mvg
    };

    tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(if flags.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(io::stderr)
        .init();

    if flags.version {
        println!("wanddraw {}", env!("CARGO_PKG_VERSION"));
        match Library::global() {
            Ok(lib) => println!("{}", lib.version()),
            Err(e) => println!("ImageMagick: {e}"),
        }
        return 0;
    }

    let canvas = match (flags.input, flags.size) {
        (Some(_), Some(_)) => {
            eprintln!("-i/--input and -s/--size are mutually exclusive");
            return 2;
        }
        (Some(_), None) if flags.background.is_some() => {
            eprintln!("-b/--background only applies to a new canvas from -s/--size");
            return 2;
        }
        (Some(input), None) => Canvas::Open(input),
        (None, Some(size)) => Canvas::New(size, flags.background),
        (None, None) => Canvas::None,
    };

    if flags.out.is_none() && flags.metrics.is_none() && !flags.mvg {
        eprintln!("Nothing to do, give -o/--out, --metrics or --mvg");
        return 2;
    }
    if flags.out.is_some() && matches!(canvas, Canvas::None) {
        eprintln!("No canvas given, use -i/--input or -s/--size");
        return 2;
    }

    let style = match flags.style {
        Some(path) => match Style::load(Path::new(&path)) {
            Ok(style) => style,
            Err(e) => {
                eprintln!("{e:#}");
                return 2;
            }
        },
        None => Style::default(),
    };

    let shapes = Shapes {
        lines: flags.line,
        rects: flags.rect,
        circles: flags.circle,
        polygons: flags.polygon,
        polylines: flags.polyline,
        texts: flags.text,
    };

    let result = run(
        canvas,
        &style,
        &shapes,
        flags.metrics.as_deref(),
        flags.mvg,
        flags.out.as_deref(),
    );

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e:#}");
            match e.downcast_ref::<wand::Error>() {
                Some(e) if e.is_usage() => 2,
                _ => 1,
            }
        }
    }
}

fn run(
    canvas: Canvas,
    style: &Style,
    shapes: &Shapes,
    metrics: Option<&str>,
    mvg: bool,
    out: Option<&str>,
) -> Result<()> {
    let lib = Library::global()?;
    info!("Using {}", lib.version());

    let image = match canvas {
        Canvas::Open(path) => Some(Image::open(lib.clone(), &path)?),
        Canvas::New(size, background) => {
            let background = match background {
                Some(spec) if spec.starts_with('#') => spec.parse::<Color>()?,
                Some(spec) => Color::parse(&lib, &spec)?,
                None => Color::WHITE,
            };
            Some(Image::new(lib.clone(), size.width, size.height, &background)?)
        }
        Canvas::None => None,
    };

    let mut drawing = Drawing::new(lib.clone())?;
    style.apply(&mut drawing)?;
    draw_shapes(&mut drawing, shapes)?;

    if mvg {
        println!("{}", drawing.vector_graphics()?);
    }

    if let Some(text) = metrics {
        let scratch;
        let target = match &image {
            Some(image) => image,
            None => {
                scratch = Image::new(lib.clone(), 1, 1, &Color::TRANSPARENT)?;
                &scratch
            }
        };
        print_metrics(&drawing.font_metrics(target, text, text.contains('\n'))?);
    }

    if let (Some(out), Some(image)) = (out, &image) {
        drawing.draw(image)?;
        image.save(out)?;
        info!("Wrote {out}");
    }
    Ok(())
}

fn draw_shapes(drawing: &mut Drawing, shapes: &Shapes) -> wand::Result<()> {
    for rect in &shapes.rects {
        drawing.rectangle(rect.to_rect())?;
    }
    for Segment(origin, perimeter) in &shapes.circles {
        drawing.circle(*origin, *perimeter)?;
    }
    for PointList(points) in &shapes.polygons {
        drawing.polygon(points.iter().copied())?;
    }
    for PointList(points) in &shapes.polylines {
        drawing.polyline(points.iter().copied())?;
    }
    for Segment(start, end) in &shapes.lines {
        drawing.line(*start, *end)?;
    }
    for text in &shapes.texts {
        drawing.text(text.x, text.y, &text.body)?;
    }
    Ok(())
}

fn print_metrics(metrics: &FontMetrics) {
    println!("character width: {}", metrics.character_width);
    println!("character height: {}", metrics.character_height);
    println!("ascender: {}", metrics.ascender);
    println!("descender: {}", metrics.descender);
    println!("text width: {}", metrics.text_width);
    println!("text height: {}", metrics.text_height);
    println!(
        "maximum horizontal advance: {}",
        metrics.maximum_horizontal_advance
    );
    println!(
        "bounds: {},{} {},{}",
        metrics.x1, metrics.y1, metrics.x2, metrics.y2
    );
    println!("origin: {},{}", metrics.x, metrics.y);
}
