//! Decoded instruction streams.
//!
//! This is the editable form a method body takes between the host's decoder
//! and encoder. Only the opcodes the rewriter inspects or emits are named;
//! everything else passes through as [`OpCode::Other`].

use std::fmt;

use crate::core::TypeName;

/// An instruction opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpCode {
    Nop,
    Ldarg,
    Ldloc,
    Stloc,
    Ldnull,
    Ldstr,
    LdcI4,
    Call,
    Callvirt,
    Newobj,
    Pop,
    Br,
    Brtrue,
    Brfalse,
    Ret,
    /// Any opcode the rewriter has no interest in, by mnemonic.
    Other(String),
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpCode::Nop => "nop",
            OpCode::Ldarg => "ldarg",
            OpCode::Ldloc => "ldloc",
            OpCode::Stloc => "stloc",
            OpCode::Ldnull => "ldnull",
            OpCode::Ldstr => "ldstr",
            OpCode::LdcI4 => "ldc.i4",
            OpCode::Call => "call",
            OpCode::Callvirt => "callvirt",
            OpCode::Newobj => "newobj",
            OpCode::Pop => "pop",
            OpCode::Br => "br",
            OpCode::Brtrue => "brtrue",
            OpCode::Brfalse => "brfalse",
            OpCode::Ret => "ret",
            OpCode::Other(mnemonic) => mnemonic,
        };
        f.write_str(s)
    }
}

/// A reference to a method, as it appears in a call operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// Type declaring the method
    pub declaring_type: TypeName,

    /// Method name; property setters use the `set_` prefix
    pub name: String,

    /// Generic arguments of an instantiated generic method
    pub generic_args: Vec<TypeName>,
}

impl MethodRef {
    pub fn new(declaring_type: TypeName, name: impl Into<String>) -> Self {
        MethodRef {
            declaring_type,
            name: name.into(),
            generic_args: Vec::new(),
        }
    }

    /// The setter of property `property` on `declaring_type`.
    pub fn property_setter(declaring_type: TypeName, property: &str) -> Self {
        MethodRef::new(declaring_type, format!("set_{}", property))
    }

    /// Instantiate a generic method with `arg`.
    pub fn with_generic_arg(mut self, arg: TypeName) -> Self {
        self.generic_args.push(arg);
        self
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)?;
        if !self.generic_args.is_empty() {
            let args: Vec<String> = self.generic_args.iter().map(|a| a.full_name()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    Method(MethodRef),
    Local(u16),
    Arg(u16),
    Int(i32),
    Str(String),
    /// Branch target, as an index into the stream
    Label(usize),
}

/// A single decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operand: Operand,
}

impl Instruction {
    pub fn new(opcode: OpCode, operand: Operand) -> Self {
        Instruction { opcode, operand }
    }

    /// An instruction without an operand.
    pub fn simple(opcode: OpCode) -> Self {
        Instruction::new(opcode, Operand::None)
    }

    /// A direct call to `method`.
    pub fn call(method: MethodRef) -> Self {
        Instruction::new(OpCode::Call, Operand::Method(method))
    }

    /// A virtual call to `method`.
    pub fn callvirt(method: MethodRef) -> Self {
        Instruction::new(OpCode::Callvirt, Operand::Method(method))
    }

    /// Load local variable `slot`.
    pub fn ldloc(slot: u16) -> Self {
        Instruction::new(OpCode::Ldloc, Operand::Local(slot))
    }

    /// Check whether this instruction calls `method`, directly or virtually.
    pub fn calls(&self, method: &MethodRef) -> bool {
        matches!(self.opcode, OpCode::Call | OpCode::Callvirt)
            && matches!(&self.operand, Operand::Method(m) if m == method)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Operand::None => write!(f, "{}", self.opcode),
            Operand::Method(m) => write!(f, "{} {}", self.opcode, m),
            Operand::Local(i) | Operand::Arg(i) => write!(f, "{} {}", self.opcode, i),
            Operand::Int(v) => write!(f, "{} {}", self.opcode, v),
            Operand::Str(s) => write!(f, "{} {:?}", self.opcode, s),
            Operand::Label(l) => write!(f, "{} IL_{:04}", self.opcode, l),
        }
    }
}
