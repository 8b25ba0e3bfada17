//! Argument decoding for each host command.
//!
//! Decoders are pure: they turn argument text into typed requests (or apply
//! it to a [`ParameterStore`]) and never touch the device. Missing fields,
//! redundant fields, and malformed literals are all
//! [`Error::InvalidParameter`].

use tracing::debug;

use btmp_core::{
    CONFIG_ADDRESS_LEN, ConfigMode, Error, RegisterAddress, RegisterSpace, Result, TestConfig,
};
use btmp_protocol::{Delimiters, FieldReader, parse_int, tokens};

use crate::action::Action;
use crate::params::{HIT_TARGET_MASK, Param, ParameterStore};

/// Largest HCI command parameter block.
pub const MAX_HCI_PAYLOAD: usize = 255;

// ---------------------------------------------------------------------------
// GetParam
// ---------------------------------------------------------------------------

/// Decode the optional index of `bt_mp_GetParam`.
///
/// `None` requests the full snapshot.
pub fn decode_get_param(args: &str, field: char) -> Result<Option<i64>> {
    let mut reader = FieldReader::new(args, field);
    let index = match reader.next() {
        Some(token) => Some(parse_int(token)?),
        None => None,
    };
    reader.finish()?;
    Ok(index)
}

// ---------------------------------------------------------------------------
// SetParam
// ---------------------------------------------------------------------------

/// Apply `idx,val|idx,val|idx,data…` to the store.
///
/// Groups are applied in order. A bad group stops processing; groups
/// before it stay applied. Returns the number of groups applied.
pub fn apply_set_param(store: &mut ParameterStore, args: &str, delims: Delimiters) -> Result<usize> {
    let mut applied = 0;
    for group in tokens(args, delims.pair) {
        let mut reader = FieldReader::new(group, delims.field);
        let Some(index_token) = reader.next() else {
            continue;
        };
        let index = parse_int(index_token)?;
        let param = Param::from_index(index)?;

        if param.is_array() {
            let data = reader
                .map(|token| parse_int(token).map(|v| v as u8))
                .collect::<Result<Vec<u8>>>()?;
            if data.is_empty() {
                return Err(Error::InvalidParameter(format!(
                    "parameter {index} needs at least one data byte"
                )));
            }
            for (offset, byte) in data.into_iter().enumerate() {
                store.set_array(index, offset, byte)?;
            }
        } else {
            let value = reader.next_int("value")?;
            reader.finish()?;
            store.set(index, value)?;
        }
        debug!(index, "parameter group applied");
        applied += 1;
    }
    Ok(applied)
}

// ---------------------------------------------------------------------------
// SetParam1 / SetParam2
// ---------------------------------------------------------------------------

/// Packet settings carried by `bt_mp_SetParam1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketSettings {
    pub channel: u8,
    pub packet_type: u8,
    pub payload_type: u8,
    pub tx_packet_count: u16,
    pub tx_gain_value: u8,
    pub whitening_coeff: u8,
}

impl PacketSettings {
    /// Decode exactly six fields.
    pub fn decode(args: &str, field: char) -> Result<Self> {
        let mut r = FieldReader::new(args, field);
        let settings = PacketSettings {
            channel: r.next_u8("channel")?,
            packet_type: r.next_u8("packet type")?,
            payload_type: r.next_u8("payload type")?,
            tx_packet_count: r.next_u16("tx packet count")?,
            tx_gain_value: r.next_u8("tx gain value")?,
            whitening_coeff: r.next_u8("whitening coefficient")?,
        };
        r.finish()?;
        Ok(settings)
    }

    pub fn apply(&self, config: &mut TestConfig) {
        config.channel = self.channel;
        config.packet_type = self.packet_type;
        config.payload_type = self.payload_type;
        config.tx_packet_count = self.tx_packet_count;
        config.tx_gain_value = self.tx_gain_value;
        config.whitening_coeff = self.whitening_coeff;
    }
}

/// Power and addressing settings carried by `bt_mp_SetParam2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerSettings {
    pub tx_gain_index: u8,
    pub tx_dac: u8,
    pub packet_header: u16,
    pub hopping_fix_channel: u8,
    pub hit_target: u64,
}

impl PowerSettings {
    /// Decode exactly five fields; the hit target is always hexadecimal.
    pub fn decode(args: &str, field: char) -> Result<Self> {
        let mut r = FieldReader::new(args, field);
        let settings = PowerSettings {
            tx_gain_index: r.next_u8("tx gain index")?,
            tx_dac: r.next_u8("tx dac")?,
            packet_header: r.next_u16("packet header")?,
            hopping_fix_channel: r.next_u8("hopping channel")?,
            hit_target: r.next_hex("hit target")? & HIT_TARGET_MASK,
        };
        r.finish()?;
        Ok(settings)
    }

    pub fn apply(&self, config: &mut TestConfig) {
        config.tx_gain_index = self.tx_gain_index;
        config.tx_dac = self.tx_dac;
        config.packet_header = self.packet_header;
        config.hopping_fix_channel = self.hopping_fix_channel;
        config.hit_target = self.hit_target;
    }
}

// ---------------------------------------------------------------------------
// RegRW
// ---------------------------------------------------------------------------

/// A decoded `bt_mp_RegRW` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRequest {
    pub address: RegisterAddress,
    /// Value to write; `None` for a read.
    pub write: Option<u32>,
}

/// Decode `type,rw,[page],addr,msb,lsb,[data]`.
///
/// The page field is present only for BB registers and the data field
/// only for writes.
pub fn decode_reg_rw(args: &str, field: char) -> Result<RegisterRequest> {
    let mut r = FieldReader::new(args, field);
    let type_code = r.next_int("register type")?;
    let space = u8::try_from(type_code)
        .ok()
        .and_then(RegisterSpace::from_code)
        .ok_or_else(|| Error::InvalidParameter(format!("unknown register type {type_code}")))?;
    let is_write = match r.next_int("rw")? {
        0 => false,
        1 => true,
        other => {
            return Err(Error::InvalidParameter(format!(
                "rw must be 0 or 1, got {other}"
            )));
        }
    };
    let page = if space.is_paged() {
        r.next_checked("page")?
    } else {
        0
    };
    let address = r.next_checked("address")?;
    let msb = r.next_checked("msb")?;
    let lsb = r.next_checked("lsb")?;
    let write = if is_write { Some(r.next_u32("data")?) } else { None };
    r.finish()?;

    Ok(RegisterRequest {
        address: RegisterAddress::new(space, page, address, msb, lsb)?,
        write,
    })
}

// ---------------------------------------------------------------------------
// HciCmd
// ---------------------------------------------------------------------------

/// A decoded `bt_mp_HciCmd` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HciRequest {
    pub opcode: u16,
    pub payload: Vec<u8>,
}

/// Decode `opcode,len,data×len`.
pub fn decode_hci_cmd(args: &str, field: char) -> Result<HciRequest> {
    let mut r = FieldReader::new(args, field);
    let opcode = r.next_u16("opcode")?;
    let declared = r.next_int("length")?;
    let len = usize::try_from(declared)
        .ok()
        .filter(|&n| n <= MAX_HCI_PAYLOAD)
        .ok_or_else(|| Error::InvalidParameter(format!("bad HCI parameter length {declared}")))?;

    let mut payload = Vec::with_capacity(len);
    for i in 0..len {
        payload.push(r.next_u8(&format!("data[{i}]"))?);
    }
    r.finish()?;
    Ok(HciRequest { opcode, payload })
}

// ---------------------------------------------------------------------------
// Exec
// ---------------------------------------------------------------------------

/// Decode the single ordinal of `bt_mp_Exec`.
pub fn decode_exec(args: &str, field: char) -> Result<Action> {
    let mut r = FieldReader::new(args, field);
    let ordinal = r.next_int("action ordinal")?;
    r.finish()?;
    Action::from_ordinal(ordinal)
        .ok_or_else(|| Error::InvalidParameter(format!("action ordinal {ordinal} out of range")))
}

// ---------------------------------------------------------------------------
// SetConfig
// ---------------------------------------------------------------------------

/// A decoded `bt_mp_SetConfig` request, ready for one store write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRequest {
    pub path: String,
    pub mode: ConfigMode,
    pub payload: Vec<u8>,
}

/// Decode `path,mode|record|record…`.
///
/// In address mode each record is one address string, stored as a
/// zero-padded [`CONFIG_ADDRESS_LEN`]-byte field. In the raw modes each
/// token of a record is one byte.
pub fn decode_set_config(args: &str, delims: Delimiters) -> Result<ConfigRequest> {
    let mut groups = tokens(args, delims.pair);
    let header = groups
        .next()
        .ok_or_else(|| Error::InvalidParameter("missing config path".into()))?;
    let mut r = FieldReader::new(header, delims.field);
    let path = r.next_str("path")?.to_string();
    let mode = ConfigMode::from_code(r.next_int("mode")?)?;
    r.finish()?;

    let mut payload = Vec::new();
    for group in groups {
        match mode {
            ConfigMode::Address => {
                let mut r = FieldReader::new(group, delims.field);
                let address = r.next_str("address")?;
                r.finish()?;
                if address.len() > CONFIG_ADDRESS_LEN {
                    return Err(Error::InvalidParameter(format!(
                        "address {address:?} longer than {CONFIG_ADDRESS_LEN} bytes"
                    )));
                }
                let start = payload.len();
                payload.extend_from_slice(address.as_bytes());
                payload.resize(start + CONFIG_ADDRESS_LEN, 0);
            }
            ConfigMode::Raw(_) => {
                for token in tokens(group, delims.field) {
                    payload.push(parse_int(token)? as u8);
                }
            }
        }
    }

    Ok(ConfigRequest {
        path,
        mode,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: Delimiters = Delimiters {
        pair: '|',
        field: ',',
        result: ',',
    };

    // -----------------------------------------------------------------------
    // GetParam
    // -----------------------------------------------------------------------

    #[test]
    fn get_param_index_optional() {
        assert_eq!(decode_get_param("", ',').unwrap(), None);
        assert_eq!(decode_get_param("0x0b", ',').unwrap(), Some(11));
        assert!(decode_get_param("1,2", ',').is_err());
        assert!(decode_get_param("one", ',').is_err());
    }

    // -----------------------------------------------------------------------
    // SetParam
    // -----------------------------------------------------------------------

    #[test]
    fn set_param_applies_groups_in_order() {
        let mut s = ParameterStore::new();
        assert_eq!(apply_set_param(&mut s, "0,0|1,10|2,1", D).unwrap(), 3);
        assert_eq!(s.get(1, ',').unwrap(), "1,0x0a");
        assert_eq!(s.get(2, ',').unwrap(), "2,0x01");
    }

    #[test]
    fn set_param_bad_index_leaves_store() {
        let mut s = ParameterStore::new();
        let before = s.clone();
        assert!(matches!(
            apply_set_param(&mut s, "99,5", D),
            Err(Error::InvalidParameter(_))
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn set_param_stops_at_bad_group() {
        let mut s = ParameterStore::new();
        assert!(apply_set_param(&mut s, "1,20|2,3,4|3,7", D).is_err());
        assert_eq!(s.config().channel, 20);
        assert_eq!(s.config().packet_type, 0x0e);
        assert_eq!(s.config().payload_type, 0x03);
    }

    #[test]
    fn set_param_bad_array_byte_leaves_table() {
        let mut s = ParameterStore::new();
        let before = *s.tx_gain_table();
        assert!(matches!(
            apply_set_param(&mut s, "12,1,2,zz", D),
            Err(Error::InvalidParameter(_))
        ));
        assert_eq!(s.tx_gain_table(), &before);
    }

    #[test]
    fn set_param_array_slots() {
        let mut s = ParameterStore::new();
        apply_set_param(&mut s, "13,1,2,3,4,5,6,7|0,2,0xaa,0xbb", D).unwrap();
        assert_eq!(s.tx_dac_table(), &[1, 2, 3, 4, 5]);
        assert_eq!(s.get(0, ',').unwrap(), "0,0x02,0xaa,0xbb");
    }

    #[test]
    fn set_param_array_needs_data() {
        let mut s = ParameterStore::new();
        assert!(apply_set_param(&mut s, "12", D).is_err());
    }

    #[test]
    fn set_param_skips_empty_groups() {
        let mut s = ParameterStore::new();
        assert_eq!(apply_set_param(&mut s, "|,|1,5||", D).unwrap(), 1);
        assert_eq!(s.config().channel, 5);
    }

    #[test]
    fn set_param_scalar_requires_value() {
        let mut s = ParameterStore::new();
        assert!(apply_set_param(&mut s, "4", D).is_err());
        assert!(apply_set_param(&mut s, "4,zz", D).is_err());
    }

    // -----------------------------------------------------------------------
    // SetParam1 / SetParam2
    // -----------------------------------------------------------------------

    #[test]
    fn packet_settings_exactly_six() {
        let p = PacketSettings::decode("39,0x0e,3,1000,0xa9,0", ',').unwrap();
        assert_eq!(p.channel, 39);
        assert_eq!(p.tx_packet_count, 1000);
        assert!(PacketSettings::decode("39,0x0e,3,1000,0xa9", ',').is_err());
        assert!(PacketSettings::decode("39,0x0e,3,1000,0xa9,0,9", ',').is_err());
    }

    #[test]
    fn power_settings_hit_target_is_hex() {
        let p = PowerSettings::decode("7,0x13,0x1234,5,e04c112233", ',').unwrap();
        assert_eq!(p.hit_target, 0xe0_4c11_2233);
        assert_eq!(p.packet_header, 0x1234);

        let mut config = ParameterStore::new().config().clone();
        p.apply(&mut config);
        assert_eq!(config.tx_gain_index, 7);
        assert_eq!(config.hopping_fix_channel, 5);
    }

    #[test]
    fn power_settings_malformed_field() {
        assert!(PowerSettings::decode("7,0x13,0x1234,5,xyz", ',').is_err());
        assert!(PowerSettings::decode("7,0x13,0x1234,5", ',').is_err());
    }

    // -----------------------------------------------------------------------
    // RegRW
    // -----------------------------------------------------------------------

    #[test]
    fn reg_rw_non_bb_read_needs_five() {
        let req = decode_reg_rw("1,0,0x3c,7,4", ',').unwrap();
        assert_eq!(req.address.space(), RegisterSpace::Rf);
        assert_eq!(req.address.address(), 0x3c);
        assert_eq!(req.write, None);

        assert!(decode_reg_rw("1,0,0x3c,7", ',').is_err());
        assert!(decode_reg_rw("1,0,0x3c,7,4,1", ',').is_err());
    }

    #[test]
    fn reg_rw_non_bb_write_takes_six() {
        let req = decode_reg_rw("1,1,0x3c,7,4,1", ',').unwrap();
        assert_eq!(req.write, Some(1));
    }

    #[test]
    fn reg_rw_bb_has_page() {
        let req = decode_reg_rw("0,1,2,0x10,15,0,0xbeef", ',').unwrap();
        assert_eq!(req.address.space(), RegisterSpace::Bb);
        assert_eq!(req.address.page(), 2);
        assert_eq!(req.write, Some(0xbeef));
        assert!(decode_reg_rw("0,0,0x10,15,0", ',').is_err());
    }

    #[test]
    fn reg_rw_rejects_bad_fields() {
        assert!(decode_reg_rw("3,0,0x10,7,0", ',').is_err());
        assert!(decode_reg_rw("1,2,0x10,7,0", ',').is_err());
        assert!(decode_reg_rw("1,0,0x10,3,4", ',').is_err());
        assert!(decode_reg_rw("1,0,0x10,32,0", ',').is_err());
        assert!(decode_reg_rw("1,0,0x10,0x105,0", ',').is_err());
        assert!(decode_reg_rw("1,0,0x10,7,-1", ',').is_err());
        assert!(decode_reg_rw("1,0,0x1003c,7,4", ',').is_err());
        assert!(decode_reg_rw("0,0,0x100,0x10,7,4", ',').is_err());
    }

    // -----------------------------------------------------------------------
    // HciCmd
    // -----------------------------------------------------------------------

    #[test]
    fn hci_cmd_length_must_match() {
        let req = decode_hci_cmd("0x1001,0", ',').unwrap();
        assert_eq!(req.opcode, 0x1001);
        assert!(req.payload.is_empty());

        let req = decode_hci_cmd("0xfc61,2,0x01,0x02", ',').unwrap();
        assert_eq!(req.payload, [1, 2]);

        assert!(decode_hci_cmd("0xfc61,2,0x01", ',').is_err());
        assert!(decode_hci_cmd("0xfc61,1,0x01,0x02", ',').is_err());
        assert!(decode_hci_cmd("0xfc61,-1", ',').is_err());
        assert!(decode_hci_cmd("0xfc61,256", ',').is_err());
    }

    // -----------------------------------------------------------------------
    // Exec
    // -----------------------------------------------------------------------

    #[test]
    fn exec_ordinal_bounds() {
        assert_eq!(decode_exec("15", ',').unwrap(), Action::HciReset);
        assert_eq!(decode_exec("0x21", ',').unwrap(), Action::ReportClear);
        assert!(decode_exec("0", ',').is_err());
        assert!(decode_exec("34", ',').is_err());
        assert!(decode_exec("15,1", ',').is_err());
        assert!(decode_exec("", ',').is_err());
    }

    // -----------------------------------------------------------------------
    // SetConfig
    // -----------------------------------------------------------------------

    #[test]
    fn set_config_address_mode_pads() {
        let req = decode_set_config("bt_addr,0|00:e0:4c:11:22:33", D).unwrap();
        assert_eq!(req.path, "bt_addr");
        assert_eq!(req.mode, ConfigMode::Address);
        assert_eq!(req.payload.len(), CONFIG_ADDRESS_LEN);
        assert_eq!(&req.payload, b"00:e0:4c:11:22:33");

        let req = decode_set_config("a,0|ab", D).unwrap();
        assert_eq!(req.payload.len(), CONFIG_ADDRESS_LEN);
        assert_eq!(&req.payload[..2], b"ab");
        assert!(req.payload[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn set_config_raw_mode_concatenates() {
        let req = decode_set_config("cal.bin,2|1,2|0x10,0x20,0x30", D).unwrap();
        assert_eq!(req.mode, ConfigMode::Raw(2));
        assert_eq!(req.payload, [1, 2, 0x10, 0x20, 0x30]);
    }

    #[test]
    fn set_config_header_shape() {
        assert!(decode_set_config("", D).is_err());
        assert!(decode_set_config("path", D).is_err());
        assert!(decode_set_config("path,4", D).is_err());
        assert!(decode_set_config("path,1,9|1", D).is_err());
        assert!(decode_set_config("a,0|00:e0:4c:11:22:33:44", D).is_err());
    }
}
