use crate::core::{AlacError, AlacResult, FrameSize, MagicCookie, StreamParams};

/// A parsed file: the stream configuration plus a view of the `mdat` payload
#[derive(Debug, Clone)]
pub struct AlacFile<'a> {
    pub cookie: MagicCookie,
    pub params: StreamParams,
    /// empty when the file has no `stsz`/`stts` tables
    pub frame_sizes: Vec<FrameSize>,
    /// framesets, without the `mdat` header
    pub payload: &'a [u8],
}

impl AlacFile<'_> {
    /// pcm frames according to the size tables, if present
    pub fn total_pcm_frames(&self) -> Option<u64> {
        if self.frame_sizes.is_empty() {
            None
        } else {
            Some(self.frame_sizes.iter().map(|f| f.pcm_frames as u64).sum())
        }
    }
}

/// binary reader for the atom layout `Writer` produces
///
/// Walks top-level atoms in any order, skipping ones it doesn't know.
pub struct Reader;

impl Reader {
    /// new reader
    pub fn new() -> Self {
        Reader
    }

    /// read and parse a file
    pub fn read<'a>(&self, data: &'a [u8]) -> AlacResult<AlacFile<'a>> {
        let mut cursor = Cursor::new(data);
        let mut cookie = None;
        let mut payload = None;
        let mut runs = Vec::new();
        let mut sizes = SampleSizes::default();

        while !cursor.is_empty() {
            let atom_start = cursor.pos;
            let atom_size = cursor.read_u32()? as usize;
            let name = cursor.read_bytes(4)?;
            let atom_end = atom_start
                .checked_add(atom_size)
                .filter(|&end| atom_size >= 8 && end <= data.len())
                .ok_or_else(|| {
                    AlacError::InvalidContainer(format!(
                        "atom {:?} has bad size {}",
                        String::from_utf8_lossy(name),
                        atom_size
                    ))
                })?;
            let body = &data[atom_start + 8..atom_end];

            match name {
                b"alac" => {
                    if cookie.is_some() {
                        return Err(AlacError::InvalidContainer(
                            "multiple alac atoms in stream".to_string(),
                        ));
                    }
                    cookie = Some(MagicCookie::parse(&data[atom_start..atom_end])?);
                }
                b"mdat" => {
                    if payload.is_some() {
                        return Err(AlacError::InvalidContainer(
                            "multiple mdat atoms found in stream".to_string(),
                        ));
                    }
                    payload = Some(body);
                }
                b"stts" => runs = self.read_stts(body)?,
                b"stsz" => sizes = self.read_stsz(body)?,
                _ => {}
            }

            cursor.pos = atom_end;
        }

        let cookie = cookie.ok_or_else(|| {
            AlacError::InvalidContainer("no alac atom found in stream".to_string())
        })?;
        let payload = payload.ok_or_else(|| {
            AlacError::InvalidContainer("no mdat atom found in stream".to_string())
        })?;

        // every frameset is at least one byte, which bounds the tables
        let frame_count = sizes.count as usize;
        let run_total: u64 = runs.iter().map(|&(count, _)| count as u64).sum();
        if frame_count > payload.len() || run_total != frame_count as u64 {
            return Err(AlacError::InvalidContainer(format!(
                "stts covers {} framesets but stsz lists {}",
                run_total, frame_count
            )));
        }

        let byte_sizes = if sizes.common_size != 0 {
            vec![sizes.common_size; frame_count]
        } else {
            sizes.entries
        };
        let frame_sizes = runs
            .into_iter()
            .flat_map(|(count, duration)| std::iter::repeat(duration).take(count as usize))
            .zip(byte_sizes)
            .map(|(pcm_frames, byte_size)| FrameSize {
                byte_size,
                pcm_frames,
            })
            .collect();

        Ok(AlacFile {
            params: cookie.to_params()?,
            cookie,
            frame_sizes,
            payload,
        })
    }

    /// time-to-sample runs as (frameset count, pcm frames each)
    fn read_stts(&self, body: &[u8]) -> AlacResult<Vec<(u32, u32)>> {
        let mut cursor = Cursor::new(body);
        cursor.skip(4)?; // version + flags
        let count = cursor.read_u32()?;
        (0..count)
            .map(|_| Ok((cursor.read_u32()?, cursor.read_u32()?)))
            .collect()
    }

    fn read_stsz(&self, body: &[u8]) -> AlacResult<SampleSizes> {
        let mut cursor = Cursor::new(body);
        cursor.skip(4)?; // version + flags
        let common_size = cursor.read_u32()?;
        let count = cursor.read_u32()?;

        let entries = if common_size == 0 {
            (0..count)
                .map(|_| cursor.read_u32())
                .collect::<AlacResult<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(SampleSizes {
            common_size,
            count,
            entries,
        })
    }
}

/// contents of an `stsz` atom
#[derive(Debug, Default)]
struct SampleSizes {
    common_size: u32,
    count: u32,
    entries: Vec<u32>,
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

// cursor helper

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn read_bytes(&mut self, count: usize) -> AlacResult<&'a [u8]> {
        if self.pos + count > self.data.len() {
            return Err(AlacError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    fn skip(&mut self, count: usize) -> AlacResult<()> {
        self.read_bytes(count).map(|_| ())
    }

    fn read_u32(&mut self) -> AlacResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
