//! XML payloads exchanged with the controller.
//!
//! Requests are rooted at `<src>`, responses at `<tc>`. Encoding never
//! touches the network; a decode failure is terminal for the operation
//! that produced the payload.
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

use super::types::{Operation, QueueEntry, WashId};

/// The list request carries no parameters.
pub const GET_QUEUE_REQUEST: &str = "<src><getQueue/></src>";

#[derive(Debug, Serialize)]
#[serde(rename = "src")]
struct AddTailRequest {
    #[serde(rename = "addTail")]
    add_tail: AddTail,
}

#[derive(Debug, Serialize)]
struct AddTail {
    #[serde(rename = "washPkgNum")]
    wash_pkg_num: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename = "src")]
struct MoveRequest {
    #[serde(rename = "move")]
    move_to: MoveBody,
}

#[derive(Debug, Serialize)]
struct MoveBody {
    id: i64,
    before: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename = "src")]
struct DeleteRequest {
    delete: DeleteBody,
}

#[derive(Debug, Serialize)]
struct DeleteBody {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct CarAddedResponse {
    #[serde(rename = "carAdded")]
    car_added: CarAdded,
}

#[derive(Debug, Deserialize)]
struct CarAdded {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    queue: QueueBody,
}

#[derive(Debug, Default, Deserialize)]
struct QueueBody {
    #[serde(rename = "car", default)]
    cars: Vec<CarXml>,
}

#[derive(Debug, Deserialize)]
struct CarXml {
    id: i64,
    #[serde(default)]
    state: String,
    #[serde(default)]
    position: i64,
    #[serde(rename = "washPkgNum", default)]
    wash_pkg_num: u32,
}

impl From<CarXml> for QueueEntry {
    fn from(car: CarXml) -> Self {
        QueueEntry {
            id: WashId(car.id),
            state: car.state,
            position: car.position,
            package: car.wash_pkg_num,
        }
    }
}

fn encode<T: Serialize>(operation: Operation, value: &T) -> Result<String, ProtocolError> {
    quick_xml::se::to_string(value).map_err(|err| ProtocolError::Encode {
        operation: operation.as_str(),
        source: err,
    })
}

/// `<src><addTail><washPkgNum>N</washPkgNum></addTail></src>`
///
/// # Errors
///
/// Returns `ProtocolError::Encode` when the serializer fails.
pub fn encode_enqueue(package: u32) -> Result<String, ProtocolError> {
    encode(
        Operation::Queue,
        &AddTailRequest {
            add_tail: AddTail {
                wash_pkg_num: package,
            },
        },
    )
}

/// `<src><move><id>N</id><before>N</before></move></src>`
///
/// # Errors
///
/// Returns `ProtocolError::Encode` when the serializer fails.
pub fn encode_move(wash: WashId, before: i64) -> Result<String, ProtocolError> {
    encode(
        Operation::Move,
        &MoveRequest {
            move_to: MoveBody { id: wash.0, before },
        },
    )
}

/// `<src><delete><id>N</id></delete></src>`
///
/// # Errors
///
/// Returns `ProtocolError::Encode` when the serializer fails.
pub fn encode_delete(wash: WashId) -> Result<String, ProtocolError> {
    encode(
        Operation::Delete,
        &DeleteRequest {
            delete: DeleteBody { id: wash.0 },
        },
    )
}

/// Parses `<tc><carAdded><id>N</id></carAdded></tc>`.
///
/// # Errors
///
/// Returns `ProtocolError::Decode` when the payload does not have that shape.
pub fn decode_enqueue_response(payload: &str) -> Result<WashId, ProtocolError> {
    let response: CarAddedResponse =
        quick_xml::de::from_str(payload).map_err(|err| ProtocolError::Decode {
            operation: Operation::Queue.as_str(),
            source: err,
        })?;
    Ok(WashId(response.car_added.id))
}

/// Parses a queue listing. Entries keep the order of the `<car>` elements.
///
/// # Errors
///
/// Returns `ProtocolError::Decode` when the payload is not a `<tc><queue>` document.
pub fn decode_queue_response(
    operation: Operation,
    payload: &str,
) -> Result<Vec<QueueEntry>, ProtocolError> {
    let response: QueueResponse =
        quick_xml::de::from_str(payload).map_err(|err| ProtocolError::Decode {
            operation: operation.as_str(),
            source: err,
        })?;
    Ok(response
        .queue
        .cars
        .into_iter()
        .map(QueueEntry::from)
        .collect())
}
