use image::GenericImageView;
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Alpha values at or above this are treated as opaque in the generated mask
const ALPHA_THRESHOLD: u8 = 128;

/// Convert a PNG with alpha into an RGB565 colour buffer and a 1-bit mask at build time.
///
/// Writes `splash.rgb565` (little-endian u16 per pixel), `splash.mask` (rows padded
/// to whole bytes, MSB first) and `splash.rs` holding the dimensions.
fn convert_image_to_masked_rgb565(
    input_path: &str,
    out_dir: &str,
    max_width: u32,
    max_height: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", input_path);

    let colors_path = format!("{}/splash.rgb565", out_dir);
    let mask_path = format!("{}/splash.mask", out_dir);
    let dims_path = format!("{}/splash.rs", out_dir);

    // Check if input file exists
    if !Path::new(input_path).exists() {
        println!("cargo:warning=Image file '{}' not found, skipping conversion", input_path);
        write_empty_splash(out_dir)?;
        return Ok(());
    }

    let mut img = image::open(input_path)?;
    println!("cargo:warning=Original splash size: {}x{}", img.width(), img.height());

    if img.width() > max_width || img.height() > max_height {
        // resize() keeps the aspect ratio and fits inside the bounds
        img = img.resize(max_width, max_height, image::imageops::FilterType::Lanczos3);
        println!("cargo:warning=Resized splash to: {}x{}", img.width(), img.height());
    }

    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();

    let bytes_per_row = width.div_ceil(8);
    let mut mask = vec![0u8; (bytes_per_row * height) as usize];
    let mut colors = Vec::with_capacity((width * height * 2) as usize);

    for y in 0..height {
        for x in 0..width {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            let rgb565 = (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3);
            colors.extend_from_slice(&rgb565.to_le_bytes());

            if a >= ALPHA_THRESHOLD {
                let byte_index = (y * bytes_per_row + x / 8) as usize;
                let bit_index = 7 - (x % 8);
                mask[byte_index] |= 1 << bit_index;
            }
        }
    }

    File::create(&colors_path)?.write_all(&colors)?;
    File::create(&mask_path)?.write_all(&mask)?;
    write_dimensions(&dims_path, width, height)?;

    println!(
        "cargo:warning=Splash conversion complete: {} colour bytes, {} mask bytes",
        colors.len(),
        mask.len()
    );
    Ok(())
}

/// Empty outputs so the include_bytes! calls still resolve.
fn write_empty_splash(out_dir: &str) -> std::io::Result<()> {
    File::create(format!("{}/splash.rgb565", out_dir))?.write_all(&[])?;
    File::create(format!("{}/splash.mask", out_dir))?.write_all(&[])?;
    write_dimensions(&format!("{}/splash.rs", out_dir), 0, 0)
}

fn write_dimensions(path: &str, width: u32, height: u32) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "pub const SPLASH_WIDTH: u32 = {};", width)?;
    writeln!(file, "pub const SPLASH_HEIGHT: u32 = {};", height)?;
    Ok(())
}

fn main() {
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    let out_dir = env::var("OUT_DIR").expect("cargo always sets OUT_DIR for build scripts");

    // The panel is 480x480, the splash is drawn centred on top of the colour wheel
    if let Err(e) = convert_image_to_masked_rgb565("splash.png", &out_dir, 480, 480) {
        println!("cargo:warning=Failed to convert splash.png: {}", e);
        // Fall back to an empty splash so the crate still builds
        if let Err(e) = write_empty_splash(&out_dir) {
            println!("cargo:warning=Could not write empty splash outputs to {}: {}", out_dir, e);
        }
    }

    println!("cargo:rerun-if-changed=splash.png");
}
