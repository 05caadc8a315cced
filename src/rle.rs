//! Run-length coded pixel streams.
//!
//! A stream is a sequence of raw RGB565 words. Two equal words in a row
//! start a run: the word after them holds the run length minus
//! [`RUN_LENGTH_BIAS`]. Any other word is a single literal pixel.

use embedded_graphics_core::pixelcolor::{Rgb565, raw::RawU16};

/// Offset added to a stored run length. The shortest run is two pixels.
pub const RUN_LENGTH_BIAS: u16 = 2;

/// Longest run a single token can carry.
pub const MAX_RUN: u32 = u16::MAX as u32 + RUN_LENGTH_BIAS as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// A run marker at `offset` has no length word after it.
    TruncatedRun { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The output slice cannot hold the encoded stream.
    OutputFull,
}

/// One decoded token of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunToken {
    Literal(u16),
    Run(u16, u32),
}

impl RunToken {
    /// Read the token at `offset`, returning it with its encoded length.
    fn read(stream: &[u16], offset: usize) -> Result<(Self, usize), DecodeError> {
        let value = stream[offset];
        match stream.get(offset + 1) {
            Some(&next) if next == value => match stream.get(offset + 2) {
                Some(&count) => Ok((
                    RunToken::Run(value, u32::from(count) + u32::from(RUN_LENGTH_BIAS)),
                    3,
                )),
                None => Err(DecodeError::TruncatedRun { offset }),
            },
            _ => Ok((RunToken::Literal(value), 1)),
        }
    }

    fn pixels(&self) -> u32 {
        match *self {
            RunToken::Literal(_) => 1,
            RunToken::Run(_, count) => count,
        }
    }
}

/// Lazily expands a validated stream into colors.
///
/// Single pass: once exhausted a fresh decoder is needed.
#[derive(Debug, Clone)]
pub struct RunLengthDecoder<'a> {
    stream: &'a [u16],
    cursor: usize,
    value: u16,
    remaining: u32,
    pixel_count: u32,
}

impl<'a> RunLengthDecoder<'a> {
    /// Validate the whole stream, then prepare to decode it.
    ///
    /// A run marker without its length word is rejected here, before any
    /// pixel is produced.
    pub fn new(stream: &'a [u16]) -> Result<Self, DecodeError> {
        let mut cursor = 0;
        let mut pixel_count: u32 = 0;
        while cursor < stream.len() {
            let (token, len) = RunToken::read(stream, cursor)?;
            pixel_count = pixel_count.saturating_add(token.pixels());
            cursor += len;
        }
        Ok(Self {
            stream,
            cursor: 0,
            value: 0,
            remaining: 0,
            pixel_count,
        })
    }

    /// Total number of pixels the stream expands to.
    pub fn pixel_count(&self) -> u32 {
        self.pixel_count
    }
}

impl Iterator for RunLengthDecoder<'_> {
    type Item = Rgb565;

    fn next(&mut self) -> Option<Rgb565> {
        if self.remaining == 0 {
            if self.cursor >= self.stream.len() {
                return None;
            }
            // Validated in `new`, so a token always fits.
            let (token, len) = RunToken::read(self.stream, self.cursor).ok()?;
            self.cursor += len;
            match token {
                RunToken::Literal(value) => {
                    self.value = value;
                    self.remaining = 1;
                }
                RunToken::Run(value, count) => {
                    self.value = value;
                    self.remaining = count;
                }
            }
        }
        self.remaining -= 1;
        Some(Rgb565::from(RawU16::new(self.value)))
    }
}

/// Encode raw pixels into `out`, returning the number of words written.
///
/// Runs of two or more equal pixels become run tokens, split when longer
/// than [`MAX_RUN`]; everything else is stored literally.
pub fn encode(pixels: &[u16], out: &mut [u16]) -> Result<usize, EncodeError> {
    let mut written = 0;
    let mut push = |word: u16| -> Result<(), EncodeError> {
        let slot = out.get_mut(written).ok_or(EncodeError::OutputFull)?;
        *slot = word;
        written += 1;
        Ok(())
    };

    let mut index = 0;
    while index < pixels.len() {
        let value = pixels[index];
        let mut run = 1;
        while index + run < pixels.len() && pixels[index + run] == value {
            run += 1;
        }
        index += run;

        let mut left = run as u32;
        while left >= u32::from(RUN_LENGTH_BIAS) {
            let chunk = left.min(MAX_RUN);
            push(value)?;
            push(value)?;
            push((chunk - u32::from(RUN_LENGTH_BIAS)) as u16)?;
            left -= chunk;
        }
        if left == 1 {
            push(value)?;
        }
    }
    Ok(written)
}
