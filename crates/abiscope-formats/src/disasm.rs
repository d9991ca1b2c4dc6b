//! Disassembly support: pc→symbol lookup and a text-section printer.
//!
//! The corpus pipeline only depends on the symbol lookup; the printer is a
//! convenience view over `.text` with a deliberately small x86-64 decoder.
//! Undecodable bytes print as `.byte` and the walk advances one byte, so a
//! gap in the opcode tables cannot derail the listing.

use crate::{Container, ParseError};
use abiscope_core::Architecture;
use std::io::{self, Write};

/// A symbol visible to the pc→symbol lookup.
#[derive(Debug, Clone)]
struct SymEntry {
    addr: u64,
    size: u64,
    name: String,
}

/// Disassembly view over a container's text section.
#[derive(Debug)]
pub struct Disasm {
    syms: Vec<SymEntry>,
    text: Vec<u8>,
    text_start: u64,
    arch: Architecture,
}

impl Disasm {
    /// Builds the view from a parsed container.
    ///
    /// Symbols come from the full symbol table when present, falling back
    /// to the dynamic table; only sized text symbols participate in the
    /// lookup.
    pub fn new(container: &dyn Container) -> Result<Self, ParseError> {
        let symbols = match container.symbols() {
            Ok(symbols) if !symbols.is_empty() => symbols,
            _ => container.dynamic_symbols()?,
        };

        let mut syms: Vec<SymEntry> = symbols
            .into_iter()
            .filter(|s| matches!(s.code, 'T' | 't') && s.size > 0 && !s.name.is_empty())
            .map(|s| SymEntry {
                addr: s.address,
                size: s.size as u64,
                name: s.name,
            })
            .collect();
        syms.sort_by_key(|s| s.addr);

        let (text_start, text) = container.text()?;
        Ok(Self {
            syms,
            text: text.to_vec(),
            text_start,
            arch: container.arch(),
        })
    }

    /// Resolves a pc to the containing symbol: (name, base address).
    pub fn lookup(&self, pc: u64) -> Option<(&str, u64)> {
        let position = self.syms.partition_point(|s| s.addr <= pc);
        if position == 0 {
            return None;
        }
        let sym = &self.syms[position - 1];
        if pc < sym.addr + sym.size {
            Some((&sym.name, sym.addr))
        } else {
            None
        }
    }

    /// Prints the text section listing: address, raw bytes, and both
    /// syntax columns. Non-amd64 architectures get a plain hex dump.
    pub fn print(&self, writer: &mut dyn Write) -> io::Result<()> {
        let mut pc = self.text_start;
        let end = self.text_start + self.text.len() as u64;

        while pc < end {
            if let Some((name, base)) = self.lookup(pc) {
                if base == pc {
                    writeln!(writer, "\n{pc:016x} <{name}>:")?;
                }
            }

            let offset = (pc - self.text_start) as usize;
            let window = &self.text[offset..];

            let insn = if self.arch == Architecture::Amd64 {
                x86_64::decode(window, pc)
            } else {
                Insn::byte(window[0])
            };

            let raw: String = window[..insn.len]
                .iter()
                .map(|b| format!("{b:02x} "))
                .collect();
            writeln!(
                writer,
                "    {pc:8x}:\t{raw:<24}\t{:<28}\t{}",
                insn.go, insn.gnu
            )?;
            pc += insn.len as u64;
        }
        Ok(())
    }
}

/// One decoded (or skipped) instruction.
#[derive(Debug)]
pub struct Insn {
    /// Bytes consumed.
    pub len: usize,
    /// Go-assembler style rendering (uppercase, destination first).
    pub go: String,
    /// GNU (AT&T) style rendering.
    pub gnu: String,
}

impl Insn {
    fn byte(value: u8) -> Self {
        Self {
            len: 1,
            go: format!("BYTE ${value:#04x}"),
            gnu: format!(".byte {value:#04x}"),
        }
    }
}

/// Minimal x86-64 decoder: common one-byte and 0F opcode maps, prefixes,
/// ModRM/SIB, and immediate widths.
mod x86_64 {
    use super::Insn;

    const REG64: [&str; 16] = [
        "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12",
        "r13", "r14", "r15",
    ];
    const REG32: [&str; 16] = [
        "eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi", "r8d", "r9d", "r10d", "r11d",
        "r12d", "r13d", "r14d", "r15d",
    ];
    const REG8: [&str; 16] = [
        "al", "cl", "dl", "bl", "spl", "bpl", "sil", "dil", "r8b", "r9b", "r10b", "r11b", "r12b",
        "r13b", "r14b", "r15b",
    ];
    const CCODES: [&str; 16] = [
        "o", "no", "b", "ae", "e", "ne", "be", "a", "s", "ns", "p", "np", "l", "ge", "le", "g",
    ];

    struct Cursor<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl<'a> Cursor<'a> {
        fn u8(&mut self) -> Option<u8> {
            let value = *self.data.get(self.pos)?;
            self.pos += 1;
            Some(value)
        }
        fn i8(&mut self) -> Option<i64> {
            Some(self.u8()? as i8 as i64)
        }
        fn i16(&mut self) -> Option<i64> {
            let bytes = self.data.get(self.pos..self.pos + 2)?;
            self.pos += 2;
            Some(i16::from_le_bytes(bytes.try_into().ok()?) as i64)
        }
        fn i32(&mut self) -> Option<i64> {
            let bytes = self.data.get(self.pos..self.pos + 4)?;
            self.pos += 4;
            Some(i32::from_le_bytes(bytes.try_into().ok()?) as i64)
        }
        fn i64(&mut self) -> Option<i64> {
            let bytes = self.data.get(self.pos..self.pos + 8)?;
            self.pos += 8;
            Some(i64::from_le_bytes(bytes.try_into().ok()?))
        }
    }

    #[derive(Default, Clone, Copy)]
    struct Rex {
        w: bool,
        r: bool,
        x: bool,
        b: bool,
    }

    /// A decoded ModRM operand pair.
    struct ModRm {
        /// Register operand (from reg field).
        reg: usize,
        /// Opcode extension (same bits as reg).
        digit: u8,
        /// r/m rendering in GNU syntax.
        rm_gnu: String,
        /// r/m rendering in Go syntax.
        rm_go: String,
    }

    fn parse_modrm(cursor: &mut Cursor, rex: Rex) -> Option<ModRm> {
        let modrm = cursor.u8()?;
        let mode = modrm >> 6;
        let reg = ((modrm >> 3) & 7) as usize + if rex.r { 8 } else { 0 };
        let digit = (modrm >> 3) & 7;
        let rm = (modrm & 7) as usize;

        if mode == 3 {
            let index = rm + if rex.b { 8 } else { 0 };
            return Some(ModRm {
                reg,
                digit,
                rm_gnu: format!("%{}", REG64[index]),
                rm_go: REG64[index].to_uppercase(),
            });
        }

        // Memory operand: base / SIB / displacement.
        let (base_text, index_text) = if rm == 4 {
            let sib = cursor.u8()?;
            let scale = 1u8 << (sib >> 6);
            let index = ((sib >> 3) & 7) as usize + if rex.x { 8 } else { 0 };
            let base = (sib & 7) as usize + if rex.b { 8 } else { 0 };
            let base_text = if (sib & 7) == 5 && mode == 0 {
                None
            } else {
                Some(REG64[base].to_string())
            };
            let index_text = if index == 4 {
                None
            } else {
                Some((REG64[index].to_string(), scale))
            };
            (base_text, index_text)
        } else if rm == 5 && mode == 0 {
            // RIP-relative.
            let disp = cursor.i32()?;
            return Some(ModRm {
                reg,
                digit,
                rm_gnu: format!("{disp:#x}(%rip)"),
                rm_go: format!("{disp:#x}(RIP)"),
            });
        } else {
            let base = rm + if rex.b { 8 } else { 0 };
            (Some(REG64[base].to_string()), None)
        };

        let disp = match mode {
            1 => cursor.i8()?,
            2 => cursor.i32()?,
            // Mode 0 still carries a disp32 when the SIB has no base.
            _ => {
                if base_text.is_none() {
                    cursor.i32()?
                } else {
                    0
                }
            }
        };

        let disp_text = if disp != 0 || base_text.is_none() {
            if disp < 0 {
                format!("-{:#x}", -disp)
            } else {
                format!("{disp:#x}")
            }
        } else {
            String::new()
        };

        let gnu = match (&base_text, &index_text) {
            (Some(base), Some((index, scale))) => {
                format!("{disp_text}(%{base},%{index},{scale})")
            }
            (Some(base), None) => format!("{disp_text}(%{base})"),
            (None, Some((index, scale))) => format!("{disp_text}(,%{index},{scale})"),
            (None, None) => disp_text.clone(),
        };
        let go = match (&base_text, &index_text) {
            (Some(base), Some((index, scale))) => {
                format!("{disp_text}({}+{}*{scale})", base.to_uppercase(), index.to_uppercase())
            }
            (Some(base), None) => format!("{disp_text}({})", base.to_uppercase()),
            (None, Some((index, scale))) => format!("{disp_text}({}*{scale})", index.to_uppercase()),
            (None, None) => disp_text.clone(),
        };

        Some(ModRm {
            reg,
            digit,
            rm_gnu: gnu,
            rm_go: go,
        })
    }

    fn reg_name(index: usize, rex_w: bool, byte_op: bool) -> &'static str {
        if byte_op {
            REG8[index]
        } else if rex_w {
            REG64[index]
        } else {
            REG32[index]
        }
    }

    fn two_operand(
        mnemonic: &str,
        modrm: &ModRm,
        rex: Rex,
        byte_op: bool,
        reg_is_source: bool,
    ) -> (String, String) {
        let reg = reg_name(modrm.reg, rex.w, byte_op);
        let suffix = if byte_op {
            "b"
        } else if rex.w {
            "q"
        } else {
            "l"
        };
        if reg_is_source {
            (
                format!(
                    "{}{} {}, {}",
                    mnemonic.to_uppercase(),
                    suffix.to_uppercase(),
                    modrm.rm_go,
                    reg.to_uppercase()
                ),
                format!("{mnemonic}{suffix} %{reg}, {}", modrm.rm_gnu),
            )
        } else {
            (
                format!(
                    "{}{} {}, {}",
                    mnemonic.to_uppercase(),
                    suffix.to_uppercase(),
                    reg.to_uppercase(),
                    modrm.rm_go
                ),
                format!("{mnemonic}{suffix} {}, %{reg}", modrm.rm_gnu),
            )
        }
    }

    /// Decodes one instruction; falls back to `.byte` on anything the
    /// table does not cover.
    pub fn decode(data: &[u8], pc: u64) -> Insn {
        match try_decode(data, pc) {
            Some(insn) => insn,
            None => Insn::byte(data[0]),
        }
    }

    fn try_decode(data: &[u8], pc: u64) -> Option<Insn> {
        let mut cursor = Cursor { data, pos: 0 };
        let mut rex = Rex::default();
        let mut rep = false;

        // Legacy and REX prefixes.
        let opcode = loop {
            let byte = cursor.u8()?;
            match byte {
                0x66 | 0x67 | 0x2e | 0x36 | 0x3e | 0x26 | 0x64 | 0x65 | 0xf0 | 0xf2 => {}
                0xf3 => rep = true,
                0x40..=0x4f => {
                    rex = Rex {
                        w: byte & 8 != 0,
                        r: byte & 4 != 0,
                        x: byte & 2 != 0,
                        b: byte & 1 != 0,
                    };
                }
                other => break other,
            }
            if cursor.pos > 8 {
                return None;
            }
        };

        let done = |cursor: &Cursor, go: String, gnu: String| -> Option<Insn> {
            Some(Insn {
                len: cursor.pos,
                go,
                gnu,
            })
        };

        match opcode {
            0xc3 => done(&cursor, "RET".into(), "ret".into()),
            0xc9 => done(&cursor, "LEAVE".into(), "leave".into()),
            0x90 => {
                if rep {
                    done(&cursor, "PAUSE".into(), "pause".into())
                } else {
                    done(&cursor, "NOP".into(), "nop".into())
                }
            }
            0xcc => done(&cursor, "INT3".into(), "int3".into()),
            0xf4 => done(&cursor, "HLT".into(), "hlt".into()),
            0x99 => done(&cursor, "CDQ".into(), "cltd".into()),
            0xc2 => {
                let imm = cursor.i16()?;
                done(&cursor, format!("RET ${imm:#x}"), format!("ret ${imm:#x}"))
            }
            0x50..=0x57 => {
                let reg = (opcode - 0x50) as usize + if rex.b { 8 } else { 0 };
                done(
                    &cursor,
                    format!("PUSHQ {}", REG64[reg].to_uppercase()),
                    format!("push %{}", REG64[reg]),
                )
            }
            0x58..=0x5f => {
                let reg = (opcode - 0x58) as usize + if rex.b { 8 } else { 0 };
                done(
                    &cursor,
                    format!("POPQ {}", REG64[reg].to_uppercase()),
                    format!("pop %{}", REG64[reg]),
                )
            }
            0xe8 | 0xe9 => {
                let rel = cursor.i32()?;
                let target = pc.wrapping_add(cursor.pos as u64).wrapping_add(rel as u64);
                let (go, gnu) = if opcode == 0xe8 {
                    (format!("CALL {target:#x}"), format!("call {target:#x}"))
                } else {
                    (format!("JMP {target:#x}"), format!("jmp {target:#x}"))
                };
                done(&cursor, go, gnu)
            }
            0xeb => {
                let rel = cursor.i8()?;
                let target = pc.wrapping_add(cursor.pos as u64).wrapping_add(rel as u64);
                done(&cursor, format!("JMP {target:#x}"), format!("jmp {target:#x}"))
            }
            0x70..=0x7f => {
                let cc = CCODES[(opcode - 0x70) as usize];
                let rel = cursor.i8()?;
                let target = pc.wrapping_add(cursor.pos as u64).wrapping_add(rel as u64);
                done(
                    &cursor,
                    format!("J{} {target:#x}", cc.to_uppercase()),
                    format!("j{cc} {target:#x}"),
                )
            }
            0x68 => {
                let imm = cursor.i32()?;
                done(&cursor, format!("PUSHQ ${imm:#x}"), format!("push ${imm:#x}"))
            }
            0x6a => {
                let imm = cursor.i8()?;
                done(&cursor, format!("PUSHQ ${imm:#x}"), format!("push ${imm:#x}"))
            }
            // mov reg, imm32/imm64
            0xb8..=0xbf => {
                let reg = (opcode - 0xb8) as usize + if rex.b { 8 } else { 0 };
                let imm = if rex.w { cursor.i64()? } else { cursor.i32()? };
                let name = if rex.w { REG64[reg] } else { REG32[reg] };
                done(
                    &cursor,
                    format!("MOV{} {}, ${imm:#x}", if rex.w { "Q" } else { "L" }, name.to_uppercase()),
                    format!("mov{} ${imm:#x}, %{name}", if rex.w { "q" } else { "l" }),
                )
            }
            // Generic r/m arithmetic and moves.
            0x00 | 0x01 | 0x08 | 0x09 | 0x20 | 0x21 | 0x28 | 0x29 | 0x30 | 0x31 | 0x38 | 0x39
            | 0x84 | 0x85 | 0x88 | 0x89 => {
                let modrm = parse_modrm(&mut cursor, rex)?;
                let byte_op = matches!(opcode, 0x00 | 0x08 | 0x20 | 0x28 | 0x30 | 0x38 | 0x84 | 0x88);
                let mnemonic = match opcode & !1 {
                    0x00 => "add",
                    0x08 => "or",
                    0x20 => "and",
                    0x28 => "sub",
                    0x30 => "xor",
                    0x38 => "cmp",
                    0x84 => "test",
                    _ => "mov",
                };
                // Direction bit clear: reg field is the source.
                let (go, gnu) = two_operand(mnemonic, &modrm, rex, byte_op, true);
                done(&cursor, go, gnu)
            }
            0x02 | 0x03 | 0x0a | 0x0b | 0x22 | 0x23 | 0x2a | 0x2b | 0x32 | 0x33 | 0x3a | 0x3b
            | 0x8a | 0x8b | 0x63 => {
                let modrm = parse_modrm(&mut cursor, rex)?;
                let byte_op = matches!(opcode, 0x02 | 0x0a | 0x22 | 0x2a | 0x32 | 0x3a | 0x8a);
                let mnemonic = match opcode {
                    0x02 | 0x03 => "add",
                    0x0a | 0x0b => "or",
                    0x22 | 0x23 => "and",
                    0x2a | 0x2b => "sub",
                    0x32 | 0x33 => "xor",
                    0x3a | 0x3b => "cmp",
                    0x63 => "movsxd",
                    _ => "mov",
                };
                // Direction bit set: reg field is the destination.
                let (go, gnu) = two_operand(mnemonic, &modrm, rex, byte_op, false);
                done(&cursor, go, gnu)
            }
            0x8d => {
                let modrm = parse_modrm(&mut cursor, rex)?;
                let reg = reg_name(modrm.reg, rex.w, false);
                done(
                    &cursor,
                    format!("LEAQ {}, {}", reg.to_uppercase(), modrm.rm_go),
                    format!("lea {}, %{reg}", modrm.rm_gnu),
                )
            }
            // Immediate group: add/or/adc/sbb/and/sub/xor/cmp.
            0x80 | 0x81 | 0x83 => {
                let modrm = parse_modrm(&mut cursor, rex)?;
                let imm = match opcode {
                    0x81 => cursor.i32()?,
                    _ => cursor.i8()?,
                };
                let mnemonic = ["add", "or", "adc", "sbb", "and", "sub", "xor", "cmp"]
                    [modrm.digit as usize];
                done(
                    &cursor,
                    format!("{} {}, ${imm:#x}", mnemonic.to_uppercase(), modrm.rm_go),
                    format!("{mnemonic} ${imm:#x}, {}", modrm.rm_gnu),
                )
            }
            0xc6 | 0xc7 => {
                let modrm = parse_modrm(&mut cursor, rex)?;
                let imm = if opcode == 0xc6 {
                    cursor.i8()?
                } else {
                    cursor.i32()?
                };
                done(
                    &cursor,
                    format!("MOV {}, ${imm:#x}", modrm.rm_go),
                    format!("mov ${imm:#x}, {}", modrm.rm_gnu),
                )
            }
            0xf6 | 0xf7 => {
                let modrm = parse_modrm(&mut cursor, rex)?;
                let mnemonic =
                    ["test", "test", "not", "neg", "mul", "imul", "div", "idiv"][modrm.digit as usize];
                if modrm.digit <= 1 {
                    let imm = if opcode == 0xf6 {
                        cursor.i8()?
                    } else {
                        cursor.i32()?
                    };
                    done(
                        &cursor,
                        format!("TEST {}, ${imm:#x}", modrm.rm_go),
                        format!("test ${imm:#x}, {}", modrm.rm_gnu),
                    )
                } else {
                    done(
                        &cursor,
                        format!("{} {}", mnemonic.to_uppercase(), modrm.rm_go),
                        format!("{mnemonic} {}", modrm.rm_gnu),
                    )
                }
            }
            0xff => {
                let modrm = parse_modrm(&mut cursor, rex)?;
                let mnemonic = match modrm.digit {
                    0 => "inc",
                    1 => "dec",
                    2 => "call",
                    4 => "jmp",
                    6 => "push",
                    _ => return None,
                };
                let star = if matches!(modrm.digit, 2 | 4) { "*" } else { "" };
                done(
                    &cursor,
                    format!("{} {}", mnemonic.to_uppercase(), modrm.rm_go),
                    format!("{mnemonic} {star}{}", modrm.rm_gnu),
                )
            }
            0x0f => {
                let second = cursor.u8()?;
                match second {
                    0x05 => done(&cursor, "SYSCALL".into(), "syscall".into()),
                    0x0b => done(&cursor, "UD2".into(), "ud2".into()),
                    0x1e => {
                        let third = cursor.u8()?;
                        if rep && third == 0xfa {
                            done(&cursor, "ENDBR64".into(), "endbr64".into())
                        } else {
                            None
                        }
                    }
                    0x1f => {
                        let modrm = parse_modrm(&mut cursor, rex)?;
                        done(
                            &cursor,
                            format!("NOP {}", modrm.rm_go),
                            format!("nop {}", modrm.rm_gnu),
                        )
                    }
                    0x80..=0x8f => {
                        let cc = CCODES[(second - 0x80) as usize];
                        let rel = cursor.i32()?;
                        let target = pc.wrapping_add(cursor.pos as u64).wrapping_add(rel as u64);
                        done(
                            &cursor,
                            format!("J{} {target:#x}", cc.to_uppercase()),
                            format!("j{cc} {target:#x}"),
                        )
                    }
                    0x90..=0x9f => {
                        let cc = CCODES[(second - 0x90) as usize];
                        let modrm = parse_modrm(&mut cursor, rex)?;
                        done(
                            &cursor,
                            format!("SET{} {}", cc.to_uppercase(), modrm.rm_go),
                            format!("set{cc} {}", modrm.rm_gnu),
                        )
                    }
                    0xaf => {
                        let modrm = parse_modrm(&mut cursor, rex)?;
                        let (go, gnu) = two_operand("imul", &modrm, rex, false, false);
                        done(&cursor, go, gnu)
                    }
                    0xb6 | 0xb7 | 0xbe | 0xbf => {
                        let modrm = parse_modrm(&mut cursor, rex)?;
                        let mnemonic = if second & 0x08 != 0 { "movsx" } else { "movzx" };
                        let (go, gnu) = two_operand(mnemonic, &modrm, rex, false, false);
                        done(&cursor, go, gnu)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn decodes_common_prologue() {
            // push %rbp
            let insn = decode(&[0x55], 0x1000);
            assert_eq!(insn.len, 1);
            assert_eq!(insn.gnu, "push %rbp");
            assert_eq!(insn.go, "PUSHQ RBP");

            // mov %rsp, %rbp
            let insn = decode(&[0x48, 0x89, 0xe5], 0x1001);
            assert_eq!(insn.len, 3);
            assert_eq!(insn.gnu, "movq %rsp, %rbp");

            // ret
            let insn = decode(&[0xc3], 0x1004);
            assert_eq!(insn.len, 1);
            assert_eq!(insn.gnu, "ret");
        }

        #[test]
        fn decodes_call_with_target() {
            // call pc+5+0x10
            let insn = decode(&[0xe8, 0x10, 0x00, 0x00, 0x00], 0x1000);
            assert_eq!(insn.len, 5);
            assert_eq!(insn.gnu, "call 0x1015");
        }

        #[test]
        fn decodes_endbr64() {
            let insn = decode(&[0xf3, 0x0f, 0x1e, 0xfa], 0x1000);
            assert_eq!(insn.len, 4);
            assert_eq!(insn.gnu, "endbr64");
        }

        #[test]
        fn unknown_bytes_fall_back() {
            let insn = decode(&[0x06], 0x1000);
            assert_eq!(insn.len, 1);
            assert!(insn.gnu.starts_with(".byte"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disasm_with(symbols: Vec<(&str, u64, u64)>) -> Disasm {
        Disasm {
            syms: symbols
                .into_iter()
                .map(|(name, addr, size)| SymEntry {
                    addr,
                    size,
                    name: name.to_string(),
                })
                .collect(),
            text: vec![0xc3],
            text_start: 0x1000,
            arch: Architecture::Amd64,
        }
    }

    #[test]
    fn lookup_finds_containing_symbol() {
        let disasm = disasm_with(vec![("first", 0x1000, 0x10), ("second", 0x1010, 0x08)]);

        assert_eq!(disasm.lookup(0x1000), Some(("first", 0x1000)));
        assert_eq!(disasm.lookup(0x100f), Some(("first", 0x1000)));
        assert_eq!(disasm.lookup(0x1010), Some(("second", 0x1010)));
        assert_eq!(disasm.lookup(0x1017), Some(("second", 0x1010)));
        // Past the last symbol's extent.
        assert_eq!(disasm.lookup(0x1018), None);
        // Before the first symbol.
        assert_eq!(disasm.lookup(0xfff), None);
    }

    #[test]
    fn lookup_handles_gaps() {
        let disasm = disasm_with(vec![("a", 0x1000, 0x4), ("b", 0x1020, 0x4)]);
        assert_eq!(disasm.lookup(0x1010), None);
        assert_eq!(disasm.lookup(0x1021), Some(("b", 0x1020)));
    }

    #[test]
    fn print_renders_listing() {
        let disasm = Disasm {
            syms: vec![SymEntry {
                addr: 0x1000,
                size: 4,
                name: "f".to_string(),
            }],
            text: vec![0x55, 0x48, 0x89, 0xe5],
            text_start: 0x1000,
            arch: Architecture::Amd64,
        };
        let mut out = Vec::new();
        disasm.print(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("<f>:"));
        assert!(text.contains("push %rbp"));
        assert!(text.contains("PUSHQ RBP"));
    }
}
