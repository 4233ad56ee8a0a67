//! Encode an iBFT description from JSON
//!
//! Usage: encode_table <description.json> <output.bin>

use ibft::Ibft;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let input = std::env::args()
        .nth(1)
        .ok_or("usage: encode_table <description.json> <output.bin>")?;
    let output = std::env::args()
        .nth(2)
        .unwrap_or_else(|| "ibft.bin".to_string());

    let json = std::fs::read_to_string(&input)?;
    let table = Ibft::from_json(&json)?;
    let bytes = table.marshal()?;

    std::fs::write(&output, &bytes)?;
    println!("Wrote {} bytes to {}", bytes.len(), output);
    println!("  fixed region: {} bytes", ibft::HEADERS_LEN);
    println!("  heap:         {} bytes", bytes.len() - ibft::HEADERS_LEN as usize);

    Ok(())
}
