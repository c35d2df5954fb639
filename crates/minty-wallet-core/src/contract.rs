//! Calldata encoding and return-value decoding for the marketplace and
//! ERC-721 contracts.

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, Bytes, B256, U256};

use crate::domain::{ActionParams, CallRequest, ValidatedIntent};
use crate::ports::PortError;

/// ERC-165 interface id of ERC-721.
pub const ERC721_INTERFACE_ID: [u8; 4] = [0x80, 0xac, 0x58, 0xcd];

const ERC721_APPROVE: &str = "function approve(address to, uint256 tokenId) external";
const ERC165_SUPPORTS_INTERFACE: &str =
    "function supportsInterface(bytes4 interfaceId) external view returns (bool)";

pub fn erc721_approve() -> Result<Function, PortError> {
    parse_human_readable(ERC721_APPROVE)
}

pub fn supports_interface() -> Result<Function, PortError> {
    parse_human_readable(ERC165_SUPPORTS_INTERFACE)
}

fn parse_human_readable(signature: &str) -> Result<Function, PortError> {
    Function::parse(signature)
        .map_err(|e| PortError::Validation(format!("invalid built-in abi '{signature}': {e}")))
}

/// Looks a function up by bare name (first overload) or by full signature
/// such as `setNFTPrice(address,uint256,uint256)`.
pub fn select_function<'a>(
    abi: &'a JsonAbi,
    method_signature: &str,
) -> Result<&'a Function, PortError> {
    let method_name = method_signature
        .split_once('(')
        .map_or(method_signature, |(name, _)| name);

    let candidates = abi
        .function(method_name)
        .ok_or_else(|| PortError::Validation(format!("method not found: {method_name}")))?;

    if method_signature.contains('(') {
        return candidates
            .iter()
            .find(|f| f.signature() == method_signature)
            .ok_or_else(|| {
                PortError::Validation(format!("method signature not found: {method_signature}"))
            });
    }

    candidates
        .first()
        .ok_or_else(|| PortError::Validation(format!("method has no overloads: {method_name}")))
}

pub fn encode_call(function: &Function, args: &[DynSolValue]) -> Result<Bytes, PortError> {
    if function.inputs.len() != args.len() {
        return Err(PortError::Validation(format!(
            "argument count mismatch for {}: expected {}, got {}",
            function.name,
            function.inputs.len(),
            args.len()
        )));
    }
    let encoded = function
        .abi_encode_input(args)
        .map_err(|e| PortError::Validation(format!("abi encoding failed: {e}")))?;
    Ok(Bytes::from(encoded))
}

pub fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<DynSolValue>, PortError> {
    function
        .abi_decode_output(data, true)
        .map_err(|e| PortError::Validation(format!("{} output decode failed: {e}", function.name)))
}

pub fn interface_id_value(interface_id: [u8; 4]) -> DynSolValue {
    let mut word = B256::ZERO;
    word[..4].copy_from_slice(&interface_id);
    DynSolValue::FixedBytes(word, 4)
}

/// Builds the `eth_call` that asks `nft_contract` whether it implements ERC-721.
pub fn supports_erc721_request(nft_contract: Address) -> Result<CallRequest, PortError> {
    let function = supports_interface()?;
    Ok(CallRequest {
        from: None,
        to: nft_contract,
        data: encode_call(&function, &[interface_id_value(ERC721_INTERFACE_ID)])?,
        value: None,
    })
}

pub fn decode_bool(function: &Function, data: &[u8]) -> Result<bool, PortError> {
    decode_output(function, data)?
        .first()
        .and_then(DynSolValue::as_bool)
        .ok_or_else(|| PortError::Validation(format!("{} did not return bool", function.name)))
}

/// `approve(marketplace, tokenId)` sent to the NFT contract.
pub fn approve_request(
    intent: &ValidatedIntent,
    marketplace: Address,
    signer: Address,
) -> Result<CallRequest, PortError> {
    let function = erc721_approve()?;
    Ok(CallRequest {
        from: Some(signer),
        to: intent.nft_contract,
        data: encode_call(
            &function,
            &[
                DynSolValue::Address(marketplace),
                DynSolValue::Uint(intent.token_id, 256),
            ],
        )?,
        value: None,
    })
}

/// Marketplace call for list, unlist and accept-proposal intents.
pub fn marketplace_request(
    abi: &JsonAbi,
    intent: &ValidatedIntent,
    marketplace: Address,
    signer: Address,
) -> Result<CallRequest, PortError> {
    let function = select_function(abi, intent.action.method_name())?;
    let mut args = vec![
        DynSolValue::Address(intent.nft_contract),
        DynSolValue::Uint(intent.token_id, 256),
    ];
    match &intent.params {
        ActionParams::Price(price_wei) => args.push(DynSolValue::Uint(*price_wei, 256)),
        ActionParams::Buyer(buyer) => args.push(DynSolValue::Address(*buyer)),
        ActionParams::None => {}
    }
    Ok(CallRequest {
        from: Some(signer),
        to: marketplace,
        data: encode_call(function, &args)?,
        value: None,
    })
}

pub fn decode_uint(function: &Function, data: &[u8]) -> Result<U256, PortError> {
    decode_output(function, data)?
        .first()
        .and_then(DynSolValue::as_uint)
        .map(|(value, _)| value)
        .ok_or_else(|| PortError::Validation(format!("{} did not return uint", function.name)))
}

/// Decodes `getAllListedNFTs()`'s parallel `(address[], uint256[])` output.
pub fn decode_listed(function: &Function, data: &[u8]) -> Result<Vec<(Address, U256)>, PortError> {
    let values = decode_output(function, data)?;
    let (addresses, token_ids) = match values.as_slice() {
        [addresses, token_ids] => (
            array_output(function, addresses, "address")?,
            array_output(function, token_ids, "token id")?,
        ),
        _ => {
            return Err(PortError::Validation(format!(
                "{} must return two arrays",
                function.name
            )))
        }
    };
    if addresses.len() != token_ids.len() {
        return Err(PortError::Validation(format!(
            "listed arrays length mismatch: {} addresses, {} token ids",
            addresses.len(),
            token_ids.len()
        )));
    }

    addresses
        .iter()
        .zip(token_ids)
        .map(|(address, token_id)| {
            let address = address
                .as_address()
                .ok_or_else(|| PortError::Validation("listed entry is not an address".to_owned()))?;
            let (token_id, _) = token_id
                .as_uint()
                .ok_or_else(|| PortError::Validation("listed entry is not a uint".to_owned()))?;
            Ok((address, token_id))
        })
        .collect()
}

fn array_output<'a>(
    function: &Function,
    value: &'a DynSolValue,
    what: &str,
) -> Result<&'a [DynSolValue], PortError> {
    value.as_array().ok_or_else(|| {
        PortError::Validation(format!("{} {what} output is not an array", function.name))
    })
}

pub fn read_request(
    abi: &JsonAbi,
    method: &str,
    to: Address,
    args: &[DynSolValue],
) -> Result<(Function, CallRequest), PortError> {
    let function = select_function(abi, method)?.clone();
    let data = encode_call(&function, args)?;
    Ok((
        function,
        CallRequest {
            from: None,
            to,
            data,
            value: None,
        },
    ))
}
