use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::info;
use rtconvolve::{Engine, EngineConfig, EngineKind};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    Karatsuba,
    Fft,
    Hybrid,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Karatsuba => Self::Karatsuba,
            EngineArg::Fft => Self::Fft,
            EngineArg::Hybrid => Self::Hybrid,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "convolve_cli")]
#[command(author = "rtconvolve")]
#[command(version = "0.1")]
#[command(about = "Convolves a WAV file against an impulse response WAV file.")]
struct Args {
    #[arg(long, help = "Input WAV file to process")]
    input: PathBuf,
    #[arg(long, help = "Impulse response WAV file")]
    ir: PathBuf,
    #[arg(long, help = "Output WAV file to write")]
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = EngineArg::Hybrid, help = "Convolution strategy")]
    engine: EngineArg,
    #[arg(long, default_value_t = 512, help = "Samples processed per block")]
    block_size: usize,
}

fn load_mono_f32(path: &PathBuf) -> Result<(Vec<f32>, u32)> {
    let reader = WavReader::open(path).with_context(|| format!("failed to open {path:?}"))?;
    let spec = reader.spec();

    let samples: Vec<f32> = if spec.sample_format == SampleFormat::Float {
        reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read float samples")?
    } else {
        let max_val = (1 << (spec.bits_per_sample - 1)) as f32;
        reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / max_val))
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read integer samples")?
    };

    let mono = if spec.channels > 1 {
        samples
            .chunks(spec.channels as usize)
            .map(|c| c.iter().sum::<f32>() / spec.channels as f32)
            .collect()
    } else {
        samples
    };

    Ok((mono, spec.sample_rate))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    info!("rtconvolve v{}", env!("CARGO_PKG_VERSION"));
    info!("Args: {:?}", args);

    let (input, sample_rate) = load_mono_f32(&args.input)?;
    let (ir, ir_sample_rate) = load_mono_f32(&args.ir)?;
    if ir_sample_rate != sample_rate {
        info!(
            "warning: IR sample rate ({ir_sample_rate} Hz) does not match input ({sample_rate} Hz); \
             proceeding without resampling"
        );
    }

    let config = EngineConfig::new(ir.len(), args.block_size)
        .context("failed to build engine configuration")?;
    let mut engine = Engine::new(args.engine.into(), config);
    engine.set_coefficients(&ir);

    let latency = engine.latency();
    info!("engine latency: {latency} samples");

    let mut output = vec![0.0f32; input.len()];
    let mut pos = 0;
    while pos < input.len() {
        let end = (pos + args.block_size).min(input.len());
        engine.process(&input[pos..end], &mut output[pos..end]);
        pos = end;
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer =
        WavWriter::create(&args.output, spec).with_context(|| format!("failed to create {:?}", args.output))?;
    for sample in output {
        writer.write_sample(sample)?;
    }
    writer.finalize().context("failed to finalize output WAV")?;

    info!("wrote {:?}", args.output);
    Ok(())
}
