//! On-disk constants of the keyboard file format.

/// File magic, first four bytes of every keyboard file.
pub const MAGIC: [u8; 4] = *b"KMKL";

/// Only major version in existence.
pub const MAJOR_VERSION: u8 = 1;

/// Supported minor versions.
pub const MINOR_VERSIONS: [u8; 3] = [3, 4, 5];

// ============================================================
// Rule opcodes
// ============================================================
//
// Rule sides are uint16 word streams. Values 0x00F0..=0x00F9 are opcodes;
// operands follow inline. Anything else in opcode position is invalid.

/// Literal UTF-16 run: `len, unit*len`.
pub const OP_STRING: u16 = 0x00F0;
/// String-table reference (1-based): `var_index`.
pub const OP_VARIABLE: u16 = 0x00F1;
/// RHS back-reference to an LHS capture: `seg_index`.
pub const OP_REFERENCE: u16 = 0x00F2;
/// LHS (after AND): virtual-key code. RHS: 1 means NULL (clear output).
pub const OP_PREDEFINED: u16 = 0x00F3;
/// Follows VARIABLE; operand selects any-of / not-any-of / indexed lookup.
pub const OP_MODIFIER: u16 = 0x00F4;
/// MODIFIER operand: character class "any unit of the variable".
pub const OP_ANYOF: u16 = 0x00F5;
/// Begins a virtual-key combination on the LHS.
pub const OP_AND: u16 = 0x00F6;
/// MODIFIER operand: character class "no unit of the variable".
pub const OP_NANYOF: u16 = 0x00F7;
/// Single printable-ASCII wildcard.
pub const OP_ANY: u16 = 0x00F8;
/// LHS: state precondition. RHS: state activation. Operand: state id.
pub const OP_SWITCH: u16 = 0x00F9;

/// Short mnemonic for loader diagnostics.
pub fn opcode_name(op: u16) -> Option<&'static str> {
    let s = match op {
        OP_STRING => "STRING",
        OP_VARIABLE => "VARIABLE",
        OP_REFERENCE => "REFERENCE",
        OP_PREDEFINED => "PREDEFINED",
        OP_MODIFIER => "MODIFIER",
        OP_ANYOF => "ANYOF",
        OP_AND => "AND",
        OP_NANYOF => "NANYOF",
        OP_ANY => "ANY",
        OP_SWITCH => "SWITCH",
        _ => return None,
    };
    Some(s)
}

// ============================================================
// Info tags
// ============================================================
//
// Info ids are four raw bytes, stored as little-endian multi-char
// constants ('name' on disk reads b"eman").

pub const TAG_NAME: [u8; 4] = *b"eman";
pub const TAG_DESCRIPTION: [u8; 4] = *b"csed";
pub const TAG_FONT: [u8; 4] = *b"tnof";
pub const TAG_ICON: [u8; 4] = *b"noci";
pub const TAG_HOTKEY: [u8; 4] = *b"ykth";
