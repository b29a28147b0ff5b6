//! Contract event lookup and decoding from receipts

use crate::error::ContractError;

use ethers::abi::{Abi, Event, RawLog, Token};
use ethers::contract::EthLogDecode;
use ethers::types::{Log, TransactionReceipt};
use std::collections::BTreeMap;

fn event<'a>(abi: &'a Abi, name: &str) -> Result<&'a Event, ContractError> {
    abi.events
        .get(name)
        .and_then(|overloads| overloads.first())
        .ok_or_else(|| ContractError::EventNotFound(name.to_string()))
}

fn raw_log(log: &Log) -> RawLog {
    RawLog {
        topics: log.topics.clone(),
        data: log.data.to_vec(),
    }
}

fn matching_logs<'r>(
    event: &Event,
    receipts: &'r [TransactionReceipt],
) -> impl Iterator<Item = &'r Log> {
    let topic = event.signature();
    receipts
        .iter()
        .flat_map(|receipt| receipt.logs.iter())
        .filter(move |log| log.topics.first() == Some(&topic))
}

/// Logs across `receipts` emitted as event `name`, in receipt order
pub fn find_event_logs(
    abi: &Abi,
    name: &str,
    receipts: &[TransactionReceipt],
) -> Result<Vec<Log>, ContractError> {
    let event = event(abi, name)?;
    Ok(matching_logs(event, receipts).cloned().collect())
}

/// Decode every `name` event into its arguments keyed by parameter name.
///
/// Indexed arguments come from the topics, the rest from the log data.
pub fn unpack_events_into_map(
    abi: &Abi,
    name: &str,
    receipts: &[TransactionReceipt],
) -> Result<Vec<BTreeMap<String, Token>>, ContractError> {
    let event = event(abi, name)?;
    matching_logs(event, receipts)
        .map(|log| {
            let parsed = event.parse_log(raw_log(log))?;
            Ok(parsed
                .params
                .into_iter()
                .map(|param| (param.name, param.value))
                .collect())
        })
        .collect()
}

/// Decode every `name` event into a typed event (e.g. one derived with `EthEvent`)
pub fn unpack_events<E: EthLogDecode>(
    abi: &Abi,
    name: &str,
    receipts: &[TransactionReceipt],
) -> Result<Vec<E>, ContractError> {
    let event = event(abi, name)?;
    matching_logs(event, receipts)
        .map(|log| Ok(E::decode_log(&raw_log(log))?))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::testing::abi_from_json;
    use ethers::contract::EthEvent;
    use ethers::types::{Address, H256, U256};

    pub const TOKEN_ABI: &str = r#"[
        {"type":"event","name":"Transfer","anonymous":false,"inputs":[
            {"name":"from","type":"address","indexed":true},
            {"name":"to","type":"address","indexed":true},
            {"name":"value","type":"uint256","indexed":false}]},
        {"type":"event","name":"Approval","anonymous":false,"inputs":[
            {"name":"owner","type":"address","indexed":true},
            {"name":"spender","type":"address","indexed":true},
            {"name":"value","type":"uint256","indexed":false}]},
        {"type":"function","name":"transfer","stateMutability":"nonpayable","inputs":[
            {"name":"to","type":"address"},
            {"name":"value","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"error","name":"InsufficientBalance","inputs":[
            {"name":"available","type":"uint256"},
            {"name":"required","type":"uint256"}]}
    ]"#;

    #[derive(Debug, Clone, PartialEq, EthEvent)]
    #[ethevent(name = "Transfer", abi = "Transfer(address,address,uint256)")]
    struct Transfer {
        #[ethevent(indexed)]
        from: Address,
        #[ethevent(indexed)]
        to: Address,
        value: U256,
    }

    pub fn event_log(abi: &Abi, name: &str, from: Address, to: Address, value: u64) -> Log {
        Log {
            topics: vec![abi.events[name][0].signature(), H256::from(from), H256::from(to)],
            data: ethers::abi::encode(&[Token::Uint(U256::from(value))]).into(),
            ..Default::default()
        }
    }

    fn receipts(abi: &Abi) -> Vec<TransactionReceipt> {
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);
        let anonymous = Log::default();
        vec![
            TransactionReceipt {
                logs: vec![
                    event_log(abi, "Transfer", alice, bob, 10),
                    event_log(abi, "Approval", alice, bob, 99),
                ],
                ..Default::default()
            },
            TransactionReceipt {
                logs: vec![anonymous, event_log(abi, "Transfer", bob, alice, 3)],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_find_event_logs_filters_by_topic() {
        let abi = abi_from_json(TOKEN_ABI);
        let logs = find_event_logs(&abi, "Transfer", &receipts(&abi)).unwrap();
        assert_eq!(logs.len(), 2);
        assert!(find_event_logs(&abi, "Transfer", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_event_name() {
        let abi = abi_from_json(TOKEN_ABI);
        let err = find_event_logs(&abi, "Burn", &receipts(&abi)).unwrap_err();
        assert!(matches!(err, ContractError::EventNotFound(name) if name == "Burn"));
    }

    #[test]
    fn test_unpack_into_map() {
        let abi = abi_from_json(TOKEN_ABI);
        let events = unpack_events_into_map(&abi, "Transfer", &receipts(&abi)).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["from"], Token::Address(Address::repeat_byte(0xa1)));
        assert_eq!(events[0]["to"], Token::Address(Address::repeat_byte(0xb0)));
        assert_eq!(events[0]["value"], Token::Uint(U256::from(10u64)));
        assert_eq!(events[1]["value"], Token::Uint(U256::from(3u64)));
    }

    #[test]
    fn test_unpack_typed() {
        let abi = abi_from_json(TOKEN_ABI);
        let events: Vec<Transfer> = unpack_events(&abi, "Transfer", &receipts(&abi)).unwrap();

        assert_eq!(
            events,
            vec![
                Transfer {
                    from: Address::repeat_byte(0xa1),
                    to: Address::repeat_byte(0xb0),
                    value: U256::from(10u64),
                },
                Transfer {
                    from: Address::repeat_byte(0xb0),
                    to: Address::repeat_byte(0xa1),
                    value: U256::from(3u64),
                },
            ]
        );
    }

    #[test]
    fn test_truncated_log_data_is_an_abi_error() {
        let abi = abi_from_json(TOKEN_ABI);
        let mut log = event_log(&abi, "Transfer", Address::zero(), Address::zero(), 1);
        log.data = vec![0u8; 4].into();
        let receipt = TransactionReceipt {
            logs: vec![log],
            ..Default::default()
        };

        let err = unpack_events_into_map(&abi, "Transfer", &[receipt]).unwrap_err();
        assert!(matches!(err, ContractError::Abi(_)));
    }
}
