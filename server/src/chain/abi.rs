//! ABI encoding for the FlightSurety contract surface

use ethers_core::abi::{self, ParamType, Token};
use ethers_core::types::{Address, Bytes, Log, H256, U256};
use ethers_core::utils::{id, keccak256};

use crate::error::ChainError;
use crate::models::{FlightStatus, RequestRecord};

pub const REGISTRATION_FEE: &str = "REGISTRATION_FEE()";
pub const REGISTER_ORACLE: &str = "registerOracle()";
pub const GET_MY_INDEXES: &str = "getMyIndexes()";
pub const SUBMIT_ORACLE_RESPONSE: &str = "submitOracleResponse(uint8,address,string,uint256,uint8)";
pub const CREDIT_INSUREES: &str = "creditInsurees(string)";
pub const ORACLE_REQUEST_EVENT: &str = "OracleRequest(uint8,address,string,uint256)";

/// Selector followed by the ABI-encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut data = id(signature).to_vec();
    data.extend(abi::encode(args));
    data.into()
}

pub fn submit_oracle_response_call(record: &RequestRecord, status: FlightStatus) -> Bytes {
    encode_call(
        SUBMIT_ORACLE_RESPONSE,
        &[
            Token::Uint(U256::from(record.index)),
            Token::Address(record.airline),
            Token::String(record.flight.clone()),
            Token::Uint(record.timestamp),
            Token::Uint(U256::from(status.code())),
        ],
    )
}

pub fn credit_insurees_call(flight: &str) -> Bytes {
    encode_call(CREDIT_INSUREES, &[Token::String(flight.to_string())])
}

pub fn oracle_request_topic() -> H256 {
    H256::from(keccak256(ORACLE_REQUEST_EVENT))
}

pub fn decode_uint256(data: &[u8]) -> Result<U256, ChainError> {
    let mut tokens = decode(&[ParamType::Uint(256)], data)?;
    tokens
        .pop()
        .and_then(Token::into_uint)
        .ok_or_else(|| ChainError::Decode("expected uint256".to_string()))
}

/// Decodes the `uint8[3]` returned by `getMyIndexes()`.
pub fn decode_indexes(data: &[u8]) -> Result<[u8; 3], ChainError> {
    let param = ParamType::FixedArray(Box::new(ParamType::Uint(8)), 3);
    let tokens = decode(&[param], data)?
        .pop()
        .and_then(Token::into_fixed_array)
        .ok_or_else(|| ChainError::Decode("expected uint8[3]".to_string()))?;

    let mut indexes = [0u8; 3];
    for (slot, token) in indexes.iter_mut().zip(tokens) {
        *slot = token_to_u8(token)?;
    }
    Ok(indexes)
}

/// Decodes an `OracleRequest` log. Every parameter of the event is unindexed.
pub fn decode_oracle_request(log: &Log) -> Result<RequestRecord, ChainError> {
    if log.topics.first() != Some(&oracle_request_topic()) {
        return Err(ChainError::Decode("log is not an OracleRequest event".to_string()));
    }

    let mut tokens = decode(
        &[ParamType::Uint(8), ParamType::Address, ParamType::String, ParamType::Uint(256)],
        &log.data,
    )?
    .into_iter();

    let index = tokens.next().map(token_to_u8).transpose()?;
    let airline = tokens.next().and_then(Token::into_address);
    let flight = tokens.next().and_then(Token::into_string);
    let timestamp = tokens.next().and_then(Token::into_uint);

    match (index, airline, flight, timestamp) {
        (Some(index), Some(airline), Some(flight), Some(timestamp)) => Ok(RequestRecord {
            index,
            airline,
            flight,
            timestamp,
            block_number: log.block_number.map(|block| block.as_u64()),
            tx_hash: log.transaction_hash,
        }),
        _ => Err(ChainError::Decode("malformed OracleRequest data".to_string())),
    }
}

fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, ChainError> {
    abi::decode(types, data).map_err(|err| ChainError::Decode(err.to_string()))
}

fn token_to_u8(token: Token) -> Result<u8, ChainError> {
    let value = token
        .into_uint()
        .ok_or_else(|| ChainError::Decode("expected an unsigned integer".to_string()))?;
    if value > U256::from(u8::MAX) {
        return Err(ChainError::Decode(format!("{value} does not fit in uint8")));
    }
    Ok(value.low_u32() as u8)
}
