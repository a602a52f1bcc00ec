//! Bit reader/writer tests

use libalac_audio::core::{AlacError, BitReader, BitWriter};

#[test]
fn test_msb_first_packing() {
    let mut writer = BitWriter::new();
    writer.write_bits(0b10110, 5);
    writer.write_bits(0b001, 3);
    writer.write_bits(0xABCD, 16);
    let bytes = writer.into_bytes();
    assert_eq!(bytes, vec![0b1011_0001, 0xAB, 0xCD]);

    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read(5).unwrap(), 0b10110);
    assert_eq!(reader.read(3).unwrap(), 0b001);
    assert_eq!(reader.read(16).unwrap(), 0xABCD);
    assert!(reader.is_exhausted());
}

#[test]
fn test_signed_values() {
    let mut writer = BitWriter::new();
    writer.write_signed(-1, 16);
    writer.write_signed(-8_388_608, 24);
    writer.write_signed(5, 3);
    let bytes = writer.into_bytes();

    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read_signed(16).unwrap(), -1);
    assert_eq!(reader.read_signed(24).unwrap(), -8_388_608);
    // 0b101 in three bits is -3
    assert_eq!(reader.read_signed(3).unwrap(), -3);
}

#[test]
fn test_byte_align_pads_with_zeros() {
    let mut writer = BitWriter::new();
    writer.write_bits(0b111, 3);
    assert!(!writer.is_aligned());
    writer.byte_align();
    assert!(writer.is_aligned());
    assert_eq!(writer.bits_written(), 8);
    assert_eq!(writer.into_bytes(), vec![0b1110_0000]);

    let bytes = [0b1010_0000, 0xFF];
    let mut reader = BitReader::new(&bytes);
    reader.read(2).unwrap();
    reader.byte_align();
    assert_eq!(reader.bit_position(), 8);
    // already aligned is a no-op
    reader.byte_align();
    assert_eq!(reader.read(8).unwrap(), 0xFF);
}

#[test]
fn test_append_unaligned() {
    let mut trial = BitWriter::new();
    trial.write_bits(0b1_0101, 5);

    let mut out = BitWriter::new();
    out.write_bits(0b11, 2);
    out.append(&trial);
    out.append(&trial);
    assert_eq!(out.bits_written(), 12);

    let bytes = out.into_bytes();
    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read(2).unwrap(), 0b11);
    assert_eq!(reader.read(5).unwrap(), 0b1_0101);
    assert_eq!(reader.read(5).unwrap(), 0b1_0101);
}

#[test]
fn test_reset_keeps_nothing() {
    let mut writer = BitWriter::new();
    writer.write_bits(0xFFFF, 13);
    writer.reset();
    assert_eq!(writer.bits_written(), 0);
    assert!(writer.into_bytes().is_empty());
}

#[test]
fn test_patch_u32() {
    let mut writer = BitWriter::new();
    let mark = writer.byte_position();
    writer.write_bits(0, 32);
    writer.write_bytes(b"mdat");
    writer.patch_u32(mark, 0x0102_0304).unwrap();
    assert_eq!(&writer.into_bytes()[..4], &[1, 2, 3, 4]);

    let mut writer = BitWriter::new();
    writer.write_bits(0, 16);
    assert!(matches!(writer.patch_u32(0, 1), Err(AlacError::Io(_))));
}

#[test]
fn test_unary_capped() {
    let mut writer = BitWriter::new();
    writer.write_unary(0, 4);
    writer.write_bits(0x1FF, 9);
    let bytes = writer.into_bytes();

    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read_unary_ones_capped(9).unwrap(), 4);
    // nine ones hit the cap without a terminator
    assert_eq!(reader.read_unary_ones_capped(9).unwrap(), 9);
    assert_eq!(reader.bit_position(), 5 + 9);
}

#[test]
fn test_reads_past_end() {
    let bytes = [0xAA];
    let mut reader = BitReader::new(&bytes);
    assert!(matches!(reader.read(9), Err(AlacError::UnexpectedEof)));
    // a failed wide read consumes nothing
    assert_eq!(reader.bit_position(), 0);
    assert_eq!(reader.read(8).unwrap(), 0xAA);
    assert!(matches!(reader.read_bit(), Err(AlacError::UnexpectedEof)));
    assert!(reader.skip(1).is_err());
}

#[test]
fn test_seek_and_remaining() {
    let bytes = [0x0F, 0xF0];
    let mut reader = BitReader::new(&bytes);
    reader.seek(4);
    assert_eq!(reader.bits_remaining(), 12);
    assert_eq!(reader.read(8).unwrap(), 0xFF);
    reader.skip(4).unwrap();
    assert!(reader.is_exhausted());
    assert_eq!(reader.bits_remaining(), 0);
}
