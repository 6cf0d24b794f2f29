use clap::{Parser, Subcommand};
use env_logger::Env;
use hound::WavSpec;
use kctape_core::{
    ByteDiagnostics, Decoder, DecoderConfig, Encoder, EncoderConfig, BIAS,
    DEFAULT_BASE_FREQUENCY, DEFAULT_DATA_BITS, DEFAULT_MAX_BITS_PER_BYTE,
    DEFAULT_MIN_CROSSING_AMPLITUDE, DEFAULT_STOP_BITS,
};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kctape")]
#[command(about = "Kansas City Standard cassette tape decoder")]
struct Cli {
    /// Log debug detail
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode WAV tape audio to binary data
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Output binary file
        #[arg(value_name = "OUTPUT.BIN")]
        output: PathBuf,

        /// Mark tone frequency in Hz
        #[arg(long, default_value_t = DEFAULT_BASE_FREQUENCY)]
        base_frequency: u32,

        /// Data bits per frame
        #[arg(long, default_value_t = DEFAULT_DATA_BITS)]
        data_bits: usize,

        /// Stop bits per frame (1 or 2)
        #[arg(long, default_value_t = DEFAULT_STOP_BITS)]
        stop_bits: usize,

        /// Moving-average noise filter window (odd), disabled when omitted
        #[arg(long)]
        noise_window: Option<usize>,

        /// Skip calibration and use this frames-per-bit value
        #[arg(long)]
        frames_per_bit: Option<f64>,

        /// Re-center each bit window on the bias level before classifying
        #[arg(long)]
        offset_adjust: bool,

        /// Minimum crossing amplitude above bias
        #[arg(long, default_value_t = DEFAULT_MIN_CROSSING_AMPLITUDE)]
        min_amplitude: u8,

        /// Widest byte window accepted, in bit times
        #[arg(long, default_value_t = DEFAULT_MAX_BITS_PER_BYTE)]
        max_bits_per_byte: usize,

        /// Print the raw sample window and bit boundaries of byte N
        #[arg(long, value_name = "N")]
        plot_byte: Option<usize>,
    },

    /// Encode binary data to WAV tape audio
    Encode {
        /// Input binary file
        #[arg(value_name = "INPUT.BIN")]
        input: PathBuf,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Mark tone frequency in Hz
        #[arg(long, default_value_t = DEFAULT_BASE_FREQUENCY)]
        base_frequency: u32,

        /// Stop bits per frame (1 or 2)
        #[arg(long, default_value_t = DEFAULT_STOP_BITS)]
        stop_bits: usize,

        /// Peak deviation from the bias level
        #[arg(long, default_value_t = 100)]
        amplitude: u8,

        /// Leader and trailer mark tone, in seconds
        #[arg(long, default_value_t = 2.0)]
        leader: f64,

        /// Output sample rate in Hz
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Decode {
            input,
            output,
            base_frequency,
            data_bits,
            stop_bits,
            noise_window,
            frames_per_bit,
            offset_adjust,
            min_amplitude,
            max_bits_per_byte,
            plot_byte,
        } => {
            let config = DecoderConfig {
                base_frequency,
                data_bits,
                stop_bits,
                noise_window,
                frames_per_bit_override: frames_per_bit,
                offset_adjust,
                min_crossing_amplitude: min_amplitude,
                max_bits_per_byte,
                diagnostic_byte_index: plot_byte,
                ..DecoderConfig::default()
            };
            decode_command(&input, &output, config)
        }
        Commands::Encode {
            input,
            output,
            base_frequency,
            stop_bits,
            amplitude,
            leader,
            sample_rate,
        } => {
            let config = EncoderConfig {
                base_frequency,
                stop_bits,
                amplitude,
                leader_secs: leader,
                trailer_secs: leader,
                ..EncoderConfig::default()
            };
            encode_command(&input, &output, config, sample_rate)
        }
    }
}

fn decode_command(
    input_path: &PathBuf,
    output_path: &PathBuf,
    config: DecoderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input_path)?;
    let mut reader = hound::WavReader::new(file)?;
    let spec = reader.spec();
    println!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    let samples = read_mono_u8(&mut reader)?;
    println!("Extracted {} samples", samples.len());

    let decoder = Decoder::new(config)?;
    let result = decoder.decode(&samples, spec.sample_rate)?;
    if let Some(calibration) = result.calibration {
        println!(
            "Frames per bit after {} samples: {:.4} (real baud rate {})",
            calibration.accepted_samples,
            calibration.frames_per_bit,
            (2.0 * f64::from(spec.sample_rate) / calibration.frames_per_bit).round() as u32
        );
    }
    if result.start_bit_errors + result.stop_bit_errors > 0 {
        println!(
            "Framing warnings: {} start bit, {} stop bit",
            result.start_bit_errors, result.stop_bit_errors
        );
    }

    let data: Vec<u8> = result.bytes.iter().map(|b| b.value).collect();
    std::fs::write(output_path, &data)?;
    println!("Wrote {} bytes to {}", data.len(), output_path.display());

    if let Some(diag) = result.diagnostics {
        print_diagnostics(&diag, spec.sample_rate);
    }
    Ok(())
}

fn encode_command(
    input_path: &PathBuf,
    output_path: &PathBuf,
    config: EncoderConfig,
    sample_rate: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input_path)?;
    println!("Read {} bytes from {}", data.len(), input_path.display());

    let encoder = Encoder::new(config)?;
    let samples = encoder.encode(&data, sample_rate);
    println!("Encoded to {} audio samples", samples.len());

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };
    let file = File::create(output_path)?;
    let mut writer = hound::WavWriter::new(file, spec)?;
    for sample in samples {
        writer.write_sample((i16::from(sample) - i16::from(BIAS)) as i8)?;
    }
    writer.finalize()?;
    println!("Wrote {}", output_path.display());
    Ok(())
}

/// Resolve the container format down to the decoder's input contract:
/// unsigned 8-bit mono amplitudes centered at the bias level. Multi-channel
/// files use the first channel.
fn read_mono_u8(
    reader: &mut hound::WavReader<File>,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let spec = reader.spec();
    let interleaved: Vec<u8> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 8) => {
            let raw: Result<Vec<i8>, _> = reader.samples::<i8>().collect();
            raw?.into_iter()
                .map(|s| (i16::from(s) + i16::from(BIAS)) as u8)
                .collect()
        }
        (hound::SampleFormat::Int, 16) => {
            let raw: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
            raw?.into_iter()
                .map(|s| ((s >> 8) + i16::from(BIAS)) as u8)
                .collect()
        }
        (hound::SampleFormat::Int, bits @ (24 | 32)) => {
            let raw: Result<Vec<i32>, _> = reader.samples::<i32>().collect();
            raw?.into_iter()
                .map(|s| ((s >> (bits - 8)) + i32::from(BIAS)) as u8)
                .collect()
        }
        (hound::SampleFormat::Float, 32) => {
            let raw: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
            raw?.into_iter()
                .map(|s| (f32::from(BIAS) + s * 127.0).clamp(0.0, 255.0) as u8)
                .collect()
        }
        (_, bits) => {
            return Err(format!("unsupported bit depth: {}", bits).into());
        }
    };

    let channels = usize::from(spec.channels.max(1));
    Ok(interleaved.into_iter().step_by(channels).collect())
}

fn print_diagnostics(diag: &ByteDiagnostics, sample_rate: u32) {
    let bits: String = diag.bits.iter().map(|b| char::from(b'0' + b)).collect();
    let secs = diag.start_frame as f64 / f64::from(sample_rate);
    println!(
        "{:04X}: {} {:02X}, sampled at: {:.5}s",
        diag.byte_index, bits, diag.value, secs
    );
    println!("bit boundaries: {:?}", diag.bit_offsets);
    for chunk in diag.window.chunks(16) {
        let row: Vec<String> = chunk.iter().map(|s| format!("{:3}", s)).collect();
        println!("  {}", row.join(" "));
    }
}
