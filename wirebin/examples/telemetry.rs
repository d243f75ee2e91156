//! Encode a small telemetry record, inspect its footprint, decode it back.
//!
//! Run with: cargo run --example telemetry

use std::collections::BTreeMap;

use wirebin::{Cursor, Error, Reader, Serializer, Wire, register};

#[derive(Wire, Debug, Default, PartialEq, Clone)]
#[wire(serializer)]
struct Fixed16 {
    raw: i32,
}

impl Serializer for Fixed16 {
    fn size_in_bytes(&self) -> usize {
        3
    }

    fn encode_to(&self, out: &mut Cursor<'_>) -> Result<(), Error> {
        // 24-bit fixed point, little-endian
        out.write(&self.raw.to_le_bytes()[..3])
    }

    fn decode_from(&mut self, input: &mut Reader<'_>) -> Result<(), Error> {
        let bytes = input.take(3)?;
        self.raw = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]);
        Ok(())
    }
}

#[derive(Wire, Debug, Default, PartialEq)]
struct Sample {
    #[wire(packed)]
    sequence: u64,
    channels: [bool; 12],
    reading: Fixed16,
    tags: BTreeMap<String, String>,
    previous: Option<Fixed16>,
    #[wire(ignore)]
    scratch: u64,
}

fn main() -> Result<(), Error> {
    register::<Sample>()?;

    let mut tags = BTreeMap::new();
    tags.insert("site".to_string(), "b7".to_string());
    let sample = Sample {
        sequence: 4821,
        channels: [
            true, false, true, true, false, false, false, true, true, false, false, true,
        ],
        reading: Fixed16 { raw: 0x012345 },
        tags,
        previous: None,
        scratch: 0xDEAD,
    };

    let bytes = wirebin::to_vec(&sample)?;
    println!("encoded {} bytes: {:02x?}", bytes.len(), bytes);
    println!("measured: {:?}", wirebin::size_of(&sample));

    let back: Sample = wirebin::from_bytes(&bytes)?;
    println!("sequence {} reading {:#x}", back.sequence, back.reading.raw);
    assert_eq!(back.scratch, 0, "ignored fields decode to their default");
    Ok(())
}
