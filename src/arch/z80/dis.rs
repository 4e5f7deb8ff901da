//! Z80 instruction decoding

use crate::analysis::{Flow, Instruction};
use crate::arch::z80::RepeatCeilings;
use crate::memory::{Image, ADDRESS_SPACE};

/// Class ids at or above this value describe single bytes that could not be
/// decoded as an instruction within the given limit.
pub const DEFB_CLASS: u32 = 0x0100_0000;

/// z80 instruction encoding uses this 3-bit enumeration to encode the target of
/// 8-bit ALU or register transfer operations.
static REGS: [&str; 8] = ["b", "c", "d", "e", "h", "l", "(hl)", "a"];

/// z80 instruction encoding uses this 2-bit enumeration to encode the target of
/// 16-bit ALU operations.
static PAIRS: [&str; 4] = ["bc", "de", "hl", "sp"];

/// z80 instruction encoding uses this 2-bit enumeration to encode the target of
/// stack manipulation instructions.
static STACK_PAIRS: [&str; 4] = ["bc", "de", "hl", "af"];

/// z80 instruction encoding uses this 3-bit enumeration to encode condition
/// codes for instructions that change control flow.
static CONDCODES: [&str; 8] = ["nz", "z", "nc", "c", "po", "pe", "p", "m"];

/// z80 instruction encoding uses this 3-bit enumeration to encode most common
/// ALU operations. The source register is always A for these operations.
static ALU_OPS: [&str; 8] = [
    "add a,", "adc a,", "sub ", "sbc a,", "and ", "xor ", "or ", "cp ",
];

/// Accumulator rotates, carry flag manipulation, and BCD adjustment.
static ALU_BITOPS: [&str; 8] = ["rlca", "rrca", "rla", "rra", "daa", "cpl", "scf", "ccf"];

/// Rotates and shifts in the `CB` page.
static ROT_OPS: [&str; 8] = ["rlc", "rrc", "rl", "rr", "sla", "sra", "sll", "srl"];

/// Block transfer, compare and I/O in the `ED` page, indexed by `y - 4` and
/// `z`.
static BLOCK_OPS: [[&str; 4]; 4] = [
    ["ldi", "cpi", "ini", "outi"],
    ["ldd", "cpd", "ind", "outd"],
    ["ldir", "cpir", "inir", "otir"],
    ["lddr", "cpdr", "indr", "otdr"],
];

static IM_MODES: [&str; 8] = ["0", "0", "1", "2", "0", "0", "1", "2"];

static ED_SPECIAL: [&str; 8] = [
    "ld i,a", "ld r,a", "ld a,i", "ld a,r", "rrd", "rld", "nop", "nop",
];

/// Which register pair stands in for HL.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Index {
    HL,
    IX,
    IY,
}

impl Index {
    fn prefix(self) -> u32 {
        match self {
            Index::HL => 0x00,
            Index::IX => 0xDD,
            Index::IY => 0xFD,
        }
    }

    /// Number of prefix bytes preceding the opcode.
    fn prefix_len(self) -> u32 {
        match self {
            Index::HL => 0,
            _ => 1,
        }
    }

    fn pair(self) -> &'static str {
        match self {
            Index::HL => "hl",
            Index::IX => "ix",
            Index::IY => "iy",
        }
    }

    fn high(self) -> &'static str {
        match self {
            Index::HL => "h",
            Index::IX => "ixh",
            Index::IY => "iyh",
        }
    }

    fn low(self) -> &'static str {
        match self {
            Index::HL => "l",
            Index::IX => "ixl",
            Index::IY => "iyl",
        }
    }

    fn indirect(self, disp: i8) -> String {
        match self {
            Index::HL => "(hl)".to_string(),
            _ => format!("({}{:+})", self.pair(), disp),
        }
    }
}

/// The shape of an instruction before its bytes are fetched.
struct Decoded {
    len: u32,
    class: u32,
    flow: Flow,
    target: Option<u32>,
    mnemonic: String,
}

impl Decoded {
    fn new<M: Into<String>>(len: u32, class: u32, mnemonic: M) -> Self {
        Decoded {
            len,
            class,
            flow: Flow::Normal,
            target: None,
            mnemonic: mnemonic.into(),
        }
    }

    fn flow(mut self, flow: Flow) -> Self {
        self.flow = flow;
        self
    }

    fn target(mut self, target: u32) -> Self {
        self.target = Some(target);
        self
    }
}

fn word(image: &Image, addr: u32) -> u32 {
    image.read(addr) as u32 | (image.read(addr + 1) as u32) << 8
}

/// Resolve a relative branch whose displacement is at `disp_addr` and whose
/// instruction ends at `next`.
fn pcrel_target(image: &Image, disp_addr: u32, next: u32) -> u32 {
    let disp = image.read(disp_addr) as i8 as i32;

    ((next as i32 + disp) as u32) & 0xFFFF
}

/// Name the 8-bit operand `r`, substituting index registers as necessary.
///
/// Instructions which address memory through an index register never
/// substitute the halves of the index register for H and L, so `plain`
/// disables that substitution.
fn reg8(r: u8, idx: Index, disp: i8, plain: bool) -> String {
    match r {
        4 if !plain => idx.high().to_string(),
        5 if !plain => idx.low().to_string(),
        6 => idx.indirect(disp),
        _ => REGS[r as usize].to_string(),
    }
}

fn pair(p: u8, idx: Index) -> &'static str {
    match p {
        2 => idx.pair(),
        _ => PAIRS[p as usize],
    }
}

fn stack_pair(p: u8, idx: Index) -> &'static str {
    match p {
        2 => idx.pair(),
        _ => STACK_PAIRS[p as usize],
    }
}

fn defb(image: &Image, address: u32) -> Instruction {
    let byte = image.read(address);

    Instruction::new(
        address,
        vec![byte],
        DEFB_CLASS | byte as u32,
        0,
        Flow::Normal,
        None,
        format!("defb ${:02x}", byte),
    )
}

/// Decode the `CB` page: rotates, shifts and bit operations.
fn decode_cb(image: &Image, addr: u32) -> Decoded {
    let op = image.read(addr + 1);
    let class = 0xCB00 | op as u32;
    let y = (op >> 3) & 0x07;
    let target = REGS[(op & 0x07) as usize];

    let mnemonic = match op >> 6 {
        0 => format!("{} {}", ROT_OPS[y as usize], target),
        1 => format!("bit {},{}", y, target),
        2 => format!("res {},{}", y, target),
        _ => format!("set {},{}", y, target),
    };

    Decoded::new(2, class, mnemonic)
}

/// Decode the `DDCB`/`FDCB` page, which operates on `(ix+d)` or `(iy+d)`.
fn decode_index_cb(image: &Image, addr: u32, idx: Index) -> Decoded {
    let disp = image.read(addr + 2) as i8;
    let op = image.read(addr + 3);
    let class = idx.prefix() << 16 | 0xCB00 | op as u32;
    let y = (op >> 3) & 0x07;
    let z = op & 0x07;
    let mem = idx.indirect(disp);

    //Undocumented forms also copy the result into a register.
    let copy = if z == 6 {
        String::new()
    } else {
        format!(",{}", REGS[z as usize])
    };

    let mnemonic = match op >> 6 {
        0 => format!("{} {}{}", ROT_OPS[y as usize], mem, copy),
        1 => format!("bit {},{}", y, mem),
        2 => format!("res {},{}{}", y, mem, copy),
        _ => format!("set {},{}{}", y, mem, copy),
    };

    Decoded::new(4, class, mnemonic)
}

/// Decode the `ED` page.
fn decode_ed(image: &Image, addr: u32) -> Decoded {
    let op = image.read(addr + 1);
    let class = 0xED00 | op as u32;
    let x = op >> 6;
    let y = (op >> 3) & 0x07;
    let z = op & 0x07;
    let p = y >> 1;
    let q = y & 0x01;

    match (x, z) {
        (1, 0) if y == 6 => Decoded::new(2, class, "in f,(c)"),
        (1, 0) => Decoded::new(2, class, format!("in {},(c)", REGS[y as usize])),
        (1, 1) if y == 6 => Decoded::new(2, class, "out (c),0"),
        (1, 1) => Decoded::new(2, class, format!("out (c),{}", REGS[y as usize])),
        (1, 2) if q == 0 => Decoded::new(2, class, format!("sbc hl,{}", PAIRS[p as usize])),
        (1, 2) => Decoded::new(2, class, format!("adc hl,{}", PAIRS[p as usize])),
        (1, 3) if q == 0 => Decoded::new(
            4,
            class,
            format!("ld (${:04x}),{}", word(image, addr + 2), PAIRS[p as usize]),
        ),
        (1, 3) => Decoded::new(
            4,
            class,
            format!("ld {},(${:04x})", PAIRS[p as usize], word(image, addr + 2)),
        ),
        (1, 4) => Decoded::new(2, class, "neg"),
        (1, 5) if y == 1 => Decoded::new(2, class, "reti").flow(Flow::Returning),
        (1, 5) => Decoded::new(2, class, "retn").flow(Flow::Returning),
        (1, 6) => Decoded::new(2, class, format!("im {}", IM_MODES[y as usize])),
        (1, 7) => Decoded::new(2, class, ED_SPECIAL[y as usize]),
        (2, 0..=3) if y >= 4 => Decoded::new(2, class, BLOCK_OPS[(y - 4) as usize][z as usize]),
        _ => Decoded::new(2, class, format!("defb $ed,${:02x}", op)),
    }
}

/// Decode an unprefixed instruction, or one prefixed by `DD`/`FD` in which HL
/// is replaced by IX/IY.
fn decode_main(image: &Image, addr: u32, idx: Index) -> Decoded {
    let pre = idx.prefix_len();
    let op = image.read(addr + pre);
    let class = idx.prefix() << 8 | op as u32;

    //Length of the prefix and opcode; operands follow.
    let base = pre + 1;
    let operand = addr + base;

    //Indexed memory operands carry a displacement byte before any immediate.
    let (disp, disp_len) = match idx {
        Index::HL => (0, 0),
        _ => (image.read(operand) as i8, 1),
    };

    //decode `op` into xxyyyzzz, with yyy further split into ppq
    let x = op >> 6;
    let y = (op >> 3) & 0x07;
    let z = op & 0x07;
    let p = y >> 1;
    let q = y & 0x01;

    match (x, z) {
        (0, 0) => match y {
            0 => Decoded::new(base, class, "nop"),
            1 => Decoded::new(base, class, "ex af,af'"),
            2 => {
                let t = pcrel_target(image, operand, addr + base + 1);
                Decoded::new(base + 1, class, format!("djnz ${:04x}", t))
                    .flow(Flow::Branching(true))
                    .target(t)
            }
            3 => {
                let t = pcrel_target(image, operand, addr + base + 1);
                Decoded::new(base + 1, class, format!("jr ${:04x}", t))
                    .flow(Flow::Branching(false))
                    .target(t)
            }
            _ => {
                let t = pcrel_target(image, operand, addr + base + 1);
                Decoded::new(
                    base + 1,
                    class,
                    format!("jr {},${:04x}", CONDCODES[(y - 4) as usize], t),
                )
                .flow(Flow::Branching(true))
                .target(t)
            }
        },
        (0, 1) if q == 0 => Decoded::new(
            base + 2,
            class,
            format!("ld {},${:04x}", pair(p, idx), word(image, operand)),
        ),
        (0, 1) => Decoded::new(base, class, format!("add {},{}", idx.pair(), pair(p, idx))),
        (0, 2) => match (q, p) {
            (0, 0) => Decoded::new(base, class, "ld (bc),a"),
            (0, 1) => Decoded::new(base, class, "ld (de),a"),
            (0, 2) => Decoded::new(
                base + 2,
                class,
                format!("ld (${:04x}),{}", word(image, operand), idx.pair()),
            ),
            (0, _) => Decoded::new(
                base + 2,
                class,
                format!("ld (${:04x}),a", word(image, operand)),
            ),
            (_, 0) => Decoded::new(base, class, "ld a,(bc)"),
            (_, 1) => Decoded::new(base, class, "ld a,(de)"),
            (_, 2) => Decoded::new(
                base + 2,
                class,
                format!("ld {},(${:04x})", idx.pair(), word(image, operand)),
            ),
            (_, _) => Decoded::new(
                base + 2,
                class,
                format!("ld a,(${:04x})", word(image, operand)),
            ),
        },
        (0, 3) if q == 0 => Decoded::new(base, class, format!("inc {}", pair(p, idx))),
        (0, 3) => Decoded::new(base, class, format!("dec {}", pair(p, idx))),
        (0, 4) | (0, 5) => {
            let name = if z == 4 { "inc" } else { "dec" };
            let len = if y == 6 { base + disp_len } else { base };

            Decoded::new(len, class, format!("{} {}", name, reg8(y, idx, disp, false)))
        }
        (0, 6) => {
            let (len, imm) = if y == 6 {
                (base + disp_len + 1, operand + disp_len)
            } else {
                (base + 1, operand)
            };

            Decoded::new(
                len,
                class,
                format!("ld {},${:02x}", reg8(y, idx, disp, false), image.read(imm)),
            )
        }
        (0, _) => Decoded::new(base, class, ALU_BITOPS[y as usize]),
        (1, 6) if y == 6 => Decoded::new(base, class, "halt"),
        (1, _) => {
            let mem = y == 6 || z == 6;
            let len = if mem { base + disp_len } else { base };

            Decoded::new(
                len,
                class,
                format!(
                    "ld {},{}",
                    reg8(y, idx, disp, mem),
                    reg8(z, idx, disp, mem)
                ),
            )
        }
        (2, _) => {
            let len = if z == 6 { base + disp_len } else { base };

            Decoded::new(
                len,
                class,
                format!("{}{}", ALU_OPS[y as usize], reg8(z, idx, disp, false)),
            )
        }
        (_, 0) => Decoded::new(base, class, format!("ret {}", CONDCODES[y as usize]))
            .flow(Flow::Branching(true)),
        (_, 1) => match (q, p) {
            (0, _) => Decoded::new(base, class, format!("pop {}", stack_pair(p, idx))),
            (_, 0) => Decoded::new(base, class, "ret").flow(Flow::Returning),
            (_, 1) => Decoded::new(base, class, "exx"),
            (_, 2) => Decoded::new(base, class, format!("jp ({})", idx.pair()))
                .flow(Flow::Branching(false)),
            (_, _) => Decoded::new(base, class, format!("ld sp,{}", idx.pair())),
        },
        (_, 2) => {
            let t = word(image, operand);
            Decoded::new(
                base + 2,
                class,
                format!("jp {},${:04x}", CONDCODES[y as usize], t),
            )
            .flow(Flow::Branching(true))
            .target(t)
        }
        (_, 3) => match y {
            0 => {
                let t = word(image, operand);
                Decoded::new(base + 2, class, format!("jp ${:04x}", t))
                    .flow(Flow::Branching(false))
                    .target(t)
            }
            2 => Decoded::new(
                base + 1,
                class,
                format!("out (${:02x}),a", image.read(operand)),
            ),
            3 => Decoded::new(
                base + 1,
                class,
                format!("in a,(${:02x})", image.read(operand)),
            ),
            4 => Decoded::new(base, class, format!("ex (sp),{}", idx.pair())),
            5 => Decoded::new(base, class, "ex de,hl"),
            6 => Decoded::new(base, class, "di"),
            7 => Decoded::new(base, class, "ei"),
            //CB is dispatched before we get here
            _ => Decoded::new(base, class, format!("defb ${:02x}", op)),
        },
        (_, 4) => {
            let t = word(image, operand);
            Decoded::new(
                base + 2,
                class,
                format!("call {},${:04x}", CONDCODES[y as usize], t),
            )
            .target(t)
        }
        (_, 5) => match (q, p) {
            (0, _) => Decoded::new(base, class, format!("push {}", stack_pair(p, idx))),
            (_, 0) => {
                let t = word(image, operand);
                Decoded::new(base + 2, class, format!("call ${:04x}", t)).target(t)
            }
            //DD, ED and FD are dispatched before we get here
            (_, _) => Decoded::new(base, class, format!("defb ${:02x}", op)),
        },
        (_, 6) => Decoded::new(
            base + 1,
            class,
            format!("{}${:02x}", ALU_OPS[y as usize], image.read(operand)),
        ),
        (_, _) => {
            let t = y as u32 * 8;
            Decoded::new(base, class, format!("rst ${:02x}", t)).target(t)
        }
    }
}

/// Decode an instruction prefixed by `DD` or `FD`.
fn decode_indexed(image: &Image, addr: u32, idx: Index) -> Decoded {
    match image.read(addr + 1) {
        //A prefix followed by another prefix does nothing.
        0xDD | 0xED | 0xFD => Decoded::new(
            1,
            DEFB_CLASS | idx.prefix(),
            format!("defb ${:02x}", idx.prefix()),
        ),
        0xCB => decode_index_cb(image, addr, idx),
        _ => decode_main(image, addr, idx),
    }
}

/// Decode the instruction at `address`, without extending past `limit`.
///
/// Instructions which would cross `limit` are returned as a single `defb`
/// byte instead, so that the caller can continue decoding from the next
/// address.
pub fn disassemble(
    image: &Image,
    address: u32,
    limit: u32,
    ceilings: &RepeatCeilings,
) -> Instruction {
    let limit = limit.min(ADDRESS_SPACE as u32);

    let decoded = match image.read(address) {
        0xCB => decode_cb(image, address),
        0xED => decode_ed(image, address),
        0xDD => decode_indexed(image, address, Index::IX),
        0xFD => decode_indexed(image, address, Index::IY),
        _ => decode_main(image, address, Index::HL),
    };

    if address + decoded.len > limit {
        return defb(image, address);
    }

    Instruction::new(
        address,
        image.slice(address, address + decoded.len).to_vec(),
        decoded.class,
        ceilings.ceiling(decoded.class),
        decoded.flow,
        decoded.target,
        decoded.mnemonic,
    )
}
