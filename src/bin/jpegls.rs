//! jpegls CLI - encode raw pixels to JPEG-LS, decode JPEG-LS and inspect headers.

use clap::{Parser, Subcommand, ValueEnum};
use env_logger::{Builder, Env};
use jpegls_rs::{ColorTransformation, FrameInfo, InterleaveMode, JpeglsDecoder, JpeglsEncoder, JpeglsPcParameters};
use std::fs;
use std::path::{Path, PathBuf};

/// Lossless and near-lossless JPEG-LS (ITU-T T.87) codec
#[derive(Parser)]
#[command(name = "jpegls")]
#[command(version)]
#[command(about = "Encode, decode and inspect JPEG-LS images", long_about = None)]
#[command(after_help = "EXAMPLES:
    jpegls encode -i pixels.raw -o image.jls -w 512 -H 512
    jpegls encode -i rgb.raw -o image.jls -w 640 -H 480 -n 3 --interleave sample --color-transform hp1
    jpegls decode -i image.jls -o image.pgm -f pnm
    jpegls info -i image.jls

Raw pixel files hold one byte per sample up to 8 bits and two little-endian bytes above that.")]
struct Cli {
    /// Log frame and scan parameters while coding
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a JPEG-LS image to raw pixels or a PGM/PPM file
    #[command(visible_alias = "d")]
    Decode {
        /// Input JPEG-LS file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the decoded pixels
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "raw", value_enum)]
        format: OutputFormat,
    },

    /// Encode raw pixels to JPEG-LS
    #[command(visible_alias = "e")]
    Encode {
        /// Input raw pixel file
        #[arg(short, long)]
        input: PathBuf,

        /// Output JPEG-LS file
        #[arg(short, long)]
        output: PathBuf,

        /// Image width in pixels
        #[arg(short, long)]
        width: u32,

        /// Image height in pixels
        #[arg(short = 'H', long)]
        height: u32,

        /// Bits per sample (2-16)
        #[arg(short, long, default_value = "8")]
        bits: i32,

        /// Number of components
        #[arg(short = 'n', long, default_value = "1")]
        components: i32,

        /// Maximum absolute error per sample (0 = lossless)
        #[arg(long, default_value = "0")]
        near_lossless: i32,

        /// Layout of the components in the input and in the scans
        #[arg(long, default_value = "none", value_enum)]
        interleave: Interleave,

        /// HP colour transformation for 3 component interleaved images
        #[arg(long, default_value = "none", value_enum)]
        color_transform: ColorTransform,

        /// Custom threshold T1 (0 keeps the default)
        #[arg(long, default_value = "0")]
        t1: i32,

        /// Custom threshold T2 (0 keeps the default)
        #[arg(long, default_value = "0")]
        t2: i32,

        /// Custom threshold T3 (0 keeps the default)
        #[arg(long, default_value = "0")]
        t3: i32,

        /// Custom context reset interval (0 keeps the default)
        #[arg(long, default_value = "0")]
        reset: i32,

        /// Text stored in a COM segment
        #[arg(long)]
        comment: Option<String>,
    },

    /// Display the frame and scan parameters of a JPEG-LS image
    #[command(visible_alias = "i")]
    Info {
        /// Input JPEG-LS file
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Raw binary pixel data
    Raw,
    /// PGM for 1 component, PPM for 3 components
    Pnm,
}

#[derive(Clone, Copy, ValueEnum)]
enum Interleave {
    None,
    Line,
    Sample,
}

impl From<Interleave> for InterleaveMode {
    fn from(value: Interleave) -> Self {
        match value {
            Interleave::None => InterleaveMode::None,
            Interleave::Line => InterleaveMode::Line,
            Interleave::Sample => InterleaveMode::Sample,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorTransform {
    None,
    Hp1,
    Hp2,
    Hp3,
}

impl From<ColorTransform> for ColorTransformation {
    fn from(value: ColorTransform) -> Self {
        match value {
            ColorTransform::None => ColorTransformation::None,
            ColorTransform::Hp1 => ColorTransformation::Hp1,
            ColorTransform::Hp2 => ColorTransformation::Hp2,
            ColorTransform::Hp3 => ColorTransformation::Hp3,
        }
    }
}

struct EncodeOptions {
    frame_info: FrameInfo,
    near_lossless: i32,
    interleave_mode: InterleaveMode,
    color_transformation: ColorTransformation,
    preset_coding_parameters: JpeglsPcParameters,
    comment: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(filter)).init();

    let result = match cli.command {
        Commands::Decode { input, output, format } => decode_image(&input, &output, &format),
        Commands::Encode {
            input,
            output,
            width,
            height,
            bits,
            components,
            near_lossless,
            interleave,
            color_transform,
            t1,
            t2,
            t3,
            reset,
            comment,
        } => encode_image(
            &input,
            &output,
            EncodeOptions {
                frame_info: FrameInfo {
                    width,
                    height,
                    bits_per_sample: bits,
                    component_count: components,
                },
                near_lossless,
                interleave_mode: interleave.into(),
                color_transformation: color_transform.into(),
                preset_coding_parameters: JpeglsPcParameters {
                    maximum_sample_value: 0,
                    threshold1: t1,
                    threshold2: t2,
                    threshold3: t3,
                    reset_value: reset,
                },
                comment,
            },
        ),
        Commands::Info { input } => show_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn decode_image(input: &Path, output: &Path, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let mut decoder = JpeglsDecoder::new(&data);
    let pixels = decoder.decode_to_vec()?;
    let parameters = decoder.parameters();
    let frame_info = parameters.frame_info;

    match format {
        OutputFormat::Raw => fs::write(output, &pixels)?,
        OutputFormat::Pnm => {
            let pixels = if parameters.interleave_mode == InterleaveMode::None {
                interleave_planes(&pixels, &frame_info)
            } else {
                pixels
            };
            write_pnm(output, &pixels, &frame_info)?;
        }
    }

    println!(
        "Decoded {}x{} image ({} components, {} bit) to {:?}",
        frame_info.width, frame_info.height, frame_info.component_count, frame_info.bits_per_sample, output
    );
    Ok(())
}

fn encode_image(input: &Path, output: &Path, options: EncodeOptions) -> Result<(), Box<dyn std::error::Error>> {
    let pixels = fs::read(input)?;

    let mut encoder = JpeglsEncoder::default();
    encoder.set_frame_info(options.frame_info)?;
    encoder.set_near_lossless(options.near_lossless)?;
    encoder.set_interleave_mode(options.interleave_mode);
    encoder.set_color_transformation(options.color_transformation);
    encoder.set_preset_coding_parameters(options.preset_coding_parameters);
    if let Some(comment) = &options.comment {
        encoder.set_comment(comment.as_bytes())?;
    }

    let encoded = encoder.encode_to_vec(&pixels)?;
    fs::write(output, &encoded)?;

    println!(
        "Encoded {}x{} image to {:?}: {} -> {} bytes ({:.2}:1)",
        options.frame_info.width,
        options.frame_info.height,
        output,
        pixels.len(),
        encoded.len(),
        pixels.len() as f64 / encoded.len() as f64
    );
    Ok(())
}

fn show_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let mut decoder = JpeglsDecoder::new(&data);
    decoder.read_header()?;
    let parameters = decoder.parameters();
    let frame_info = parameters.frame_info;

    println!("File: {:?}", input);
    println!("Size: {} bytes", data.len());
    println!();
    println!("Format: JPEG-LS");
    println!("  Dimensions:    {}x{}", frame_info.width, frame_info.height);
    println!("  Bit depth:     {} bits", frame_info.bits_per_sample);
    println!("  Components:    {}", frame_info.component_count);
    println!("  Interleave:    {:?}", parameters.interleave_mode);
    println!(
        "  Mode:          {}",
        if parameters.near_lossless == 0 {
            "Lossless".to_string()
        } else {
            format!("Near-lossless (NEAR={})", parameters.near_lossless)
        }
    );
    if parameters.color_transformation != ColorTransformation::None {
        println!("  Transform:     {:?}", parameters.color_transformation);
    }
    if parameters.preset_coding_parameters != JpeglsPcParameters::default() {
        let preset = parameters.preset_coding_parameters;
        println!(
            "  Presets:       MAXVAL={} T1={} T2={} T3={} RESET={}",
            preset.maximum_sample_value, preset.threshold1, preset.threshold2, preset.threshold3, preset.reset_value
        );
    }
    println!("  Decoded size:  {} bytes", decoder.destination_size());
    Ok(())
}

/// Converts plane by plane samples into pixel interleaved order.
fn interleave_planes(pixels: &[u8], frame_info: &FrameInfo) -> Vec<u8> {
    let sample_size = frame_info.bytes_per_sample();
    let components = frame_info.component_count as usize;
    let plane_size = pixels.len() / components;
    let mut interleaved = vec![0; pixels.len()];

    for (component, plane) in pixels.chunks_exact(plane_size).enumerate() {
        for (index, sample) in plane.chunks_exact(sample_size).enumerate() {
            let offset = (index * components + component) * sample_size;
            interleaved[offset..offset + sample_size].copy_from_slice(sample);
        }
    }
    interleaved
}

fn write_pnm(output: &Path, pixels: &[u8], frame_info: &FrameInfo) -> Result<(), Box<dyn std::error::Error>> {
    let magic = match frame_info.component_count {
        1 => "P5",
        3 => "P6",
        count => return Err(format!("PNM output needs 1 or 3 components, the image has {}", count).into()),
    };

    let maximum_value = (1u32 << frame_info.bits_per_sample) - 1;
    let mut data = format!("{}\n{} {}\n{}\n", magic, frame_info.width, frame_info.height, maximum_value).into_bytes();
    if frame_info.bits_per_sample <= 8 {
        data.extend_from_slice(pixels);
    } else {
        // PNM stores 16 bit samples big-endian.
        for sample in pixels.chunks_exact(2) {
            data.extend_from_slice(&[sample[1], sample[0]]);
        }
    }

    fs::write(output, data)?;
    Ok(())
}
