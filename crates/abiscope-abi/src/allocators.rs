//! Register and stack-slot allocation.
//!
//! One [`RegisterAllocator`] is constructed per function build and dropped
//! at its end, so allocation state never leaks across symbols.

use crate::classify::RegisterClass;
use crate::AbiError;

/// Tracks the framebase cursor for stack-passed arguments.
///
/// The cursor starts at 8 to reserve the return-address slot and only ever
/// moves forward, in multiples of eight.
#[derive(Debug)]
pub struct FramebaseAllocator {
    framebase: i64,
}

impl Default for FramebaseAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FramebaseAllocator {
    pub fn new() -> Self {
        Self { framebase: 8 }
    }

    /// Next greater-or-equal multiple of eight.
    fn next_multiple_of_eight(number: i64) -> i64 {
        (number + 7) & -8
    }

    /// Returns the slot for a value of `size` bytes and advances the
    /// cursor past it.
    pub fn next_framebase(&mut self, size: i64) -> String {
        let result = format!("framebase+{}", self.framebase);
        self.framebase += Self::next_multiple_of_eight(size.max(0));
        result
    }

    /// Current cursor value.
    pub fn cursor(&self) -> i64 {
        self.framebase
    }
}

/// Provides the next register (or stack slot) for a classified argument.
#[derive(Debug)]
pub struct RegisterAllocator {
    framebase: FramebaseAllocator,
    /// Integer register stack; the top (end) is %rdi.
    int_registers: Vec<&'static str>,
    /// SSE register stack; the top (end) is %xmm0.
    sse_registers: Vec<&'static str>,
}

impl Default for RegisterAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterAllocator {
    pub fn new() -> Self {
        Self {
            framebase: FramebaseAllocator::new(),
            int_registers: vec!["%r9", "%r8", "%rcx", "%rdx", "%rsi", "%rdi"],
            sse_registers: vec![
                "%xmm7", "%xmm6", "%xmm5", "%xmm4", "%xmm3", "%xmm2", "%xmm1", "%xmm0",
            ],
        }
    }

    fn next_int_register(&mut self) -> Option<&'static str> {
        self.int_registers.pop()
    }

    fn next_sse_register(&mut self) -> Option<&'static str> {
        self.sse_registers.pop()
    }

    /// Maps a classification to one location string.
    ///
    /// `class_name` is the classification's type-kind name; empty
    /// aggregates resolve to the literal `"none"`.
    pub fn register_for(
        &mut self,
        lo: RegisterClass,
        hi: RegisterClass,
        size: i64,
        class_name: &str,
    ) -> Result<String, AbiError> {
        // Empty structs and unions don't have a location.
        if lo == RegisterClass::NoClass
            && matches!(class_name, "Struct" | "Union" | "Class" | "Structure")
        {
            return Ok("none".to_string());
        }

        if lo == RegisterClass::NoClass {
            return Err(AbiError::Unallocatable(class_name.to_string()));
        }

        if lo == RegisterClass::Memory {
            return Ok(self.framebase.next_framebase(size));
        }

        if lo == RegisterClass::Integer {
            return Ok(match self.next_int_register() {
                Some(register) => register.to_string(),
                // Ran out of registers, put it on the stack.
                None => self.framebase.next_framebase(size),
            });
        }

        if lo == RegisterClass::Sse {
            // TODO: when hi is SSEUP the eightbyte belongs in the next
            // chunk of the same vector register; emit the primary
            // register until multi-register locations land.
            return Ok(match self.next_sse_register() {
                Some(register) => register.to_string(),
                None => self.framebase.next_framebase(size),
            });
        }

        // X87 family always goes through memory.
        if matches!(lo, RegisterClass::X87 | RegisterClass::ComplexX87)
            || hi == RegisterClass::X87Up
        {
            return Ok(self.framebase.next_framebase(size));
        }

        Err(AbiError::UnknownClassification(lo, hi))
    }

    /// Current framebase cursor (for tests and diagnostics).
    pub fn framebase_cursor(&self) -> i64 {
        self.framebase.cursor()
    }
}
