//! 3GPP Milenage Algorithm
//!
//! Milenage as defined in 3GPP TS 35.205/35.206, checked against the
//! TS 35.208 test sets. Provides f1/f1*, f2-f5/f5*, OPc derivation, quintet
//! generation, AUTS re-synchronisation and the USIM side check.

use crate::aes::Aes128Context;

// Length constants
pub const OGS_RAND_LEN: usize = 16;
pub const OGS_AUTN_LEN: usize = 16;
pub const OGS_AUTS_LEN: usize = 14;
pub const OGS_RES_LEN: usize = 8;
pub const OGS_AK_LEN: usize = 6;
pub const OGS_SQN_LEN: usize = 6;
pub const OGS_AMF_LEN: usize = 2;
pub const OGS_MAC_LEN: usize = 8;

/// AMF used when computing MAC-S for AUTS (TS 33.102 6.3.3)
const RESYNC_AMF: [u8; OGS_AMF_LEN] = [0x00, 0x00];

/// Error type for Milenage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilenageError {
    /// AES key schedule failed
    AesError,
    /// MAC-A or MAC-S verification failed
    MacMismatch,
}

/// f2, f3, f4, f5 and f5* outputs for one RAND
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilenageOutput {
    pub res: [u8; OGS_RES_LEN],
    pub ck: [u8; 16],
    pub ik: [u8; 16],
    pub ak: [u8; OGS_AK_LEN],
    pub ak_star: [u8; OGS_AK_LEN],
}

/// Authentication quintet produced by the network side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilenageVector {
    pub rand: [u8; OGS_RAND_LEN],
    pub autn: [u8; OGS_AUTN_LEN],
    pub xres: [u8; OGS_RES_LEN],
    pub ck: [u8; 16],
    pub ik: [u8; 16],
}

/// Result of the USIM side AUTN check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MilenageCheck {
    /// AUTN is authentic and fresh
    Accepted {
        res: [u8; OGS_RES_LEN],
        ck: [u8; 16],
        ik: [u8; 16],
        sqn: [u8; OGS_SQN_LEN],
    },
    /// AUTN is authentic but its SQN is not fresh
    SyncFailure { auts: [u8; OGS_AUTS_LEN] },
}

fn xor16(a: &[u8; 16], b: &[u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
        *o = x ^ y;
    }
    out
}

/// Cyclic left rotation by `r` bits; every Milenage rotation is byte aligned
fn rotate(input: &[u8; 16], r: usize) -> [u8; 16] {
    let shift = r / 8;
    let mut out = [0u8; 16];
    for (i, o) in out.iter_mut().enumerate() {
        *o = input[(i + shift) % 16];
    }
    out
}

/// OUT = E_K(rot(TEMP xor OPc, r) xor c) xor OPc, with c a single trailing byte
fn out_block(
    ctx: &Aes128Context,
    opc: &[u8; 16],
    temp: &[u8; 16],
    r: usize,
    c: u8,
) -> [u8; 16] {
    let mut input = rotate(&xor16(temp, opc), r);
    input[15] ^= c;
    xor16(&ctx.encrypt_block(&input), opc)
}

fn cipher(k: &[u8; 16]) -> Result<Aes128Context, MilenageError> {
    Aes128Context::new(k).map_err(|_| MilenageError::AesError)
}

/// Generate OPc from K and OP
pub fn milenage_opc(k: &[u8; 16], op: &[u8; 16]) -> Result<[u8; 16], MilenageError> {
    let ctx = cipher(k)?;
    Ok(xor16(&ctx.encrypt_block(op), op))
}

/// Milenage f1 and f1*, returning (MAC-A, MAC-S)
pub fn milenage_f1(
    opc: &[u8; 16],
    k: &[u8; 16],
    rand: &[u8; OGS_RAND_LEN],
    sqn: &[u8; OGS_SQN_LEN],
    amf: &[u8; OGS_AMF_LEN],
) -> Result<([u8; OGS_MAC_LEN], [u8; OGS_MAC_LEN]), MilenageError> {
    let ctx = cipher(k)?;
    let temp = ctx.encrypt_block(&xor16(rand, opc));

    // IN1 = SQN || AMF || SQN || AMF
    let mut in1 = [0u8; 16];
    in1[..6].copy_from_slice(sqn);
    in1[6..8].copy_from_slice(amf);
    in1[8..14].copy_from_slice(sqn);
    in1[14..].copy_from_slice(amf);

    // OUT1 = E_K(TEMP xor rot(IN1 xor OPc, r1) xor c1) xor OPc, r1 = 64, c1 = 0
    let mut input = rotate(&xor16(&in1, opc), 64);
    for (b, t) in input.iter_mut().zip(temp.iter()) {
        *b ^= t;
    }
    let out1 = xor16(&ctx.encrypt_block(&input), opc);

    let mut mac_a = [0u8; OGS_MAC_LEN];
    let mut mac_s = [0u8; OGS_MAC_LEN];
    mac_a.copy_from_slice(&out1[..8]);
    mac_s.copy_from_slice(&out1[8..]);
    Ok((mac_a, mac_s))
}

/// Milenage f2, f3, f4, f5 and f5*
pub fn milenage_f2345(
    opc: &[u8; 16],
    k: &[u8; 16],
    rand: &[u8; OGS_RAND_LEN],
) -> Result<MilenageOutput, MilenageError> {
    let ctx = cipher(k)?;
    let temp = ctx.encrypt_block(&xor16(rand, opc));

    // (r2, c2) = (0, 1), (r3, c3) = (32, 2), (r4, c4) = (64, 4), (r5, c5) = (96, 8)
    let out2 = out_block(&ctx, opc, &temp, 0, 0x01);
    let ck = out_block(&ctx, opc, &temp, 32, 0x02);
    let ik = out_block(&ctx, opc, &temp, 64, 0x04);
    let out5 = out_block(&ctx, opc, &temp, 96, 0x08);

    let mut output = MilenageOutput {
        res: [0u8; OGS_RES_LEN],
        ck,
        ik,
        ak: [0u8; OGS_AK_LEN],
        ak_star: [0u8; OGS_AK_LEN],
    };
    output.ak.copy_from_slice(&out2[..6]);
    output.res.copy_from_slice(&out2[8..]);
    output.ak_star.copy_from_slice(&out5[..6]);
    Ok(output)
}

/// Generate an authentication quintet; AUTN = (SQN xor AK) || AMF || MAC-A
pub fn milenage_generate(
    opc: &[u8; 16],
    amf: &[u8; OGS_AMF_LEN],
    k: &[u8; 16],
    sqn: &[u8; OGS_SQN_LEN],
    rand: &[u8; OGS_RAND_LEN],
) -> Result<MilenageVector, MilenageError> {
    let (mac_a, _) = milenage_f1(opc, k, rand, sqn, amf)?;
    let f = milenage_f2345(opc, k, rand)?;

    let mut autn = [0u8; OGS_AUTN_LEN];
    for i in 0..OGS_SQN_LEN {
        autn[i] = sqn[i] ^ f.ak[i];
    }
    autn[6..8].copy_from_slice(amf);
    autn[8..].copy_from_slice(&mac_a);

    Ok(MilenageVector {
        rand: *rand,
        autn,
        xres: f.res,
        ck: f.ck,
        ik: f.ik,
    })
}

/// Validate AUTS from a synchronisation failure and recover SQN_MS
pub fn milenage_auts(
    opc: &[u8; 16],
    k: &[u8; 16],
    rand: &[u8; OGS_RAND_LEN],
    auts: &[u8; OGS_AUTS_LEN],
) -> Result<[u8; OGS_SQN_LEN], MilenageError> {
    let f = milenage_f2345(opc, k, rand)?;

    let mut sqn = [0u8; OGS_SQN_LEN];
    for i in 0..OGS_SQN_LEN {
        sqn[i] = auts[i] ^ f.ak_star[i];
    }

    let (_, mac_s) = milenage_f1(opc, k, rand, &sqn, &RESYNC_AMF)?;
    if mac_s != auts[6..] {
        return Err(MilenageError::MacMismatch);
    }
    Ok(sqn)
}

/// USIM side check of RAND/AUTN against the highest accepted SQN
///
/// A received SQN must be strictly greater than `sqn_ms`; otherwise an AUTS
/// carrying `sqn_ms` is produced.
pub fn milenage_check(
    opc: &[u8; 16],
    k: &[u8; 16],
    sqn_ms: &[u8; OGS_SQN_LEN],
    rand: &[u8; OGS_RAND_LEN],
    autn: &[u8; OGS_AUTN_LEN],
) -> Result<MilenageCheck, MilenageError> {
    let f = milenage_f2345(opc, k, rand)?;

    let mut rx_sqn = [0u8; OGS_SQN_LEN];
    for i in 0..OGS_SQN_LEN {
        rx_sqn[i] = autn[i] ^ f.ak[i];
    }

    let amf = [autn[6], autn[7]];
    let (mac_a, _) = milenage_f1(opc, k, rand, &rx_sqn, &amf)?;
    if mac_a != autn[8..] {
        return Err(MilenageError::MacMismatch);
    }

    if rx_sqn <= *sqn_ms {
        let mut auts = [0u8; OGS_AUTS_LEN];
        for i in 0..OGS_SQN_LEN {
            auts[i] = sqn_ms[i] ^ f.ak_star[i];
        }
        let (_, mac_s) = milenage_f1(opc, k, rand, sqn_ms, &RESYNC_AMF)?;
        auts[6..].copy_from_slice(&mac_s);
        return Ok(MilenageCheck::SyncFailure { auts });
    }

    Ok(MilenageCheck::Accepted {
        res: f.res,
        ck: f.ck,
        ik: f.ik,
        sqn: rx_sqn,
    })
}
