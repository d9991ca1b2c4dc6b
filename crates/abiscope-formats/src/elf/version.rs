//! GNU symbol version tables (.gnu.version / .gnu.version_r).
//!
//! The versym table assigns each dynamic symbol a 16-bit version index;
//! the verneed chain maps those indices to (library, version) pairs for
//! imported symbols.

use abiscope_core::Endianness;

/// A needed-version entry resolved from the verneed chain.
#[derive(Debug, Clone, Default)]
pub struct VersionNeed {
    /// Library file name (from vn_file).
    pub library: String,
    /// Version string (from vna_name).
    pub version: String,
}

/// Parsed version tables for one dynamic symbol table.
#[derive(Debug, Default)]
pub struct VersionTable {
    /// versym entries, one per dynamic symbol.
    versym: Vec<u16>,
    /// version index -> needed version.
    needs: Vec<Option<VersionNeed>>,
}

impl VersionTable {
    /// Parses the versym array and verneed chain.
    ///
    /// `strtab` is the dynamic string table the vn_file/vna_name offsets
    /// index into. Malformed chains end the walk early rather than fail:
    /// version data is advisory.
    pub fn parse(
        versym_data: &[u8],
        verneed_data: &[u8],
        verneed_count: usize,
        strtab: &[u8],
        endianness: Endianness,
    ) -> Self {
        let read_u16 = |data: &[u8], offset: usize| -> Option<u16> {
            let bytes = [*data.get(offset)?, *data.get(offset + 1)?];
            Some(match endianness {
                Endianness::Little => u16::from_le_bytes(bytes),
                Endianness::Big => u16::from_be_bytes(bytes),
            })
        };
        let read_u32 = |data: &[u8], offset: usize| -> Option<u32> {
            let bytes = [
                *data.get(offset)?,
                *data.get(offset + 1)?,
                *data.get(offset + 2)?,
                *data.get(offset + 3)?,
            ];
            Some(match endianness {
                Endianness::Little => u32::from_le_bytes(bytes),
                Endianness::Big => u32::from_be_bytes(bytes),
            })
        };

        let versym = versym_data
            .chunks_exact(2)
            .map(|chunk| {
                let bytes = [chunk[0], chunk[1]];
                match endianness {
                    Endianness::Little => u16::from_le_bytes(bytes),
                    Endianness::Big => u16::from_be_bytes(bytes),
                }
            })
            .collect();

        let mut needs: Vec<Option<VersionNeed>> = Vec::new();
        let mut offset = 0usize;
        'verneed: for _ in 0..verneed_count {
            let Some(vn_cnt) = read_u16(verneed_data, offset + 2) else {
                break;
            };
            let Some(vn_file) = read_u32(verneed_data, offset + 4) else {
                break;
            };
            let Some(vn_aux) = read_u32(verneed_data, offset + 8) else {
                break;
            };
            let Some(vn_next) = read_u32(verneed_data, offset + 12) else {
                break;
            };

            let library = get_string(strtab, vn_file as usize).unwrap_or_default();

            let mut aux_offset = offset + vn_aux as usize;
            for _ in 0..vn_cnt {
                let Some(vna_other) = read_u16(verneed_data, aux_offset + 6) else {
                    break 'verneed;
                };
                let Some(vna_name) = read_u32(verneed_data, aux_offset + 8) else {
                    break 'verneed;
                };
                let Some(vna_next) = read_u32(verneed_data, aux_offset + 12) else {
                    break 'verneed;
                };

                let index = (vna_other & 0x7fff) as usize;
                if index >= needs.len() {
                    needs.resize(index + 1, None);
                }
                needs[index] = Some(VersionNeed {
                    library: library.to_string(),
                    version: get_string(strtab, vna_name as usize)
                        .unwrap_or_default()
                        .to_string(),
                });

                if vna_next == 0 {
                    break;
                }
                aux_offset += vna_next as usize;
            }

            if vn_next == 0 {
                break;
            }
            offset += vn_next as usize;
        }

        Self { versym, needs }
    }

    /// Looks up (library, version) for the dynamic symbol at `sym_index`.
    ///
    /// Indices 0 (local) and 1 (global) carry no version.
    pub fn lookup(&self, sym_index: usize) -> (String, String) {
        let Some(&raw) = self.versym.get(sym_index) else {
            return (String::new(), String::new());
        };
        let index = (raw & 0x7fff) as usize;
        if index <= 1 {
            return (String::new(), String::new());
        }
        match self.needs.get(index).and_then(|n| n.as_ref()) {
            Some(need) => (need.library.clone(), need.version.clone()),
            None => (String::new(), String::new()),
        }
    }
}

fn get_string(table: &[u8], start: usize) -> Option<&str> {
    if start >= table.len() {
        return None;
    }
    let remaining = &table[start..];
    let end = remaining.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&remaining[..end]).ok()
}
