use crate::calibration::CalibrationTable;
use crate::source::ByteFrame;
use crate::{OutputRecord, RecordSpan};

use super::error::DsmError;
use super::layout;
use super::reader::PacketReader;
use super::{ProtocolVariant, ReceiverType, Resolution, channel_name};

/// Decode one complete 16-frame packet into its output records.
///
/// Record order is fixed: header record(s) first, then the seven channel
/// slots in transmission order. Byte values never cause a failure; the
/// only error is a packet that is not exactly 16 frames.
pub fn decode_packet(
    frames: &[ByteFrame],
    receiver: ReceiverType,
    fallback: ProtocolVariant,
    calibration: Option<&CalibrationTable>,
) -> Result<Vec<OutputRecord>, DsmError> {
    let reader = PacketReader::new(frames);
    reader.require_exact(layout::PACKET_FRAMES)?;

    let (detected, mut records) = decode_header(&reader, receiver, fallback)?;
    // In-band identity wins; the configured fallback covers external
    // receivers and unrecognized system bytes alike.
    let effective = detected.unwrap_or(fallback);

    for slot in 0..layout::CHANNEL_SLOTS {
        records.push(decode_channel(&reader, slot, effective, calibration)?);
    }
    Ok(records)
}

fn decode_header(
    reader: &PacketReader<'_>,
    receiver: ReceiverType,
    fallback: ProtocolVariant,
) -> Result<(Option<ProtocolVariant>, Vec<OutputRecord>), DsmError> {
    match receiver {
        ReceiverType::Internal => {
            let fades = u16::from(reader.byte(0)?);
            let detected = ProtocolVariant::from_system_byte(reader.byte(1)?);
            let records = vec![
                OutputRecord::Fades {
                    span: reader.span(0, 0)?,
                    fades,
                },
                OutputRecord::System {
                    span: reader.span(1, 1)?,
                    protocol: detected,
                    matches_configured: detected == Some(fallback),
                },
            ];
            Ok((detected, records))
        }
        ReceiverType::External => {
            let fades = reader.pair_u16_be(0)?;
            let records = vec![OutputRecord::Fades {
                span: reader.span(0, 1)?,
                fades,
            }];
            Ok((None, records))
        }
    }
}

fn decode_channel(
    reader: &PacketReader<'_>,
    slot: usize,
    protocol: ProtocolVariant,
    calibration: Option<&CalibrationTable>,
) -> Result<OutputRecord, DsmError> {
    let first = layout::HEADER_FRAMES + slot * 2;
    let raw = reader.pair_u16_be(first)?;
    let span = reader.span(first, first + 1)?;

    let (position, channel_id, phase) = split_channel_word(raw, protocol.resolution());
    let name = channel_name(channel_id).to_string();
    let slot = slot as u8;

    let percent = calibration.and_then(|table| table.percent_for(channel_id, position));
    Ok(match percent {
        Some(percent) => OutputRecord::ChannelExtended {
            span,
            slot,
            channel_id,
            name,
            position,
            phase,
            percent,
        },
        None => OutputRecord::ChannelBase {
            span,
            slot,
            channel_id,
            name,
            position,
            phase,
        },
    })
}

fn split_channel_word(raw: u16, resolution: Resolution) -> (u16, u8, Option<u8>) {
    match resolution {
        Resolution::Res1024 => {
            let position = raw & layout::POSITION_MASK_1024;
            let channel_id = ((raw >> layout::CHANNEL_ID_SHIFT_1024)
                & layout::CHANNEL_ID_MASK_1024) as u8;
            (position, channel_id, None)
        }
        Resolution::Res2048 => {
            let position = raw & layout::POSITION_MASK_2048;
            let channel_id = ((raw >> layout::CHANNEL_ID_SHIFT_2048)
                & layout::CHANNEL_ID_MASK_2048) as u8;
            let phase = ((raw >> layout::PHASE_SHIFT_2048) & 1) as u8;
            (position, channel_id, Some(phase))
        }
    }
}
