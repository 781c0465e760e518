#![allow(dead_code)]

use campwire::domain::account::{Account, Amount, Role};
use campwire::domain::ports::{LedgerStore, WriteUnit};
use campwire::domain::transaction::{Transaction, TransactionKind};
use campwire::infrastructure::in_memory::InMemoryLedger;

/// Registers an account and credits its opening balance through a normal
/// ledger unit, so every test starts from audited state.
pub async fn seed_account(
    store: &InMemoryLedger,
    name: &str,
    email: &str,
    role: Role,
    credits: u64,
) -> Account {
    let account = Account::new(name, email, role);
    store.insert_account(account.clone()).await.unwrap();
    if credits > 0 {
        let amount = Amount::new(credits).unwrap();
        store
            .commit(
                WriteUnit::new()
                    .credit(account.id.clone(), amount)
                    .append(Transaction::self_entry(
                        &account.id,
                        TransactionKind::Credit,
                        amount,
                        "opening balance",
                    )),
            )
            .await
            .unwrap();
    }
    store.account(&account.id).await.unwrap().unwrap()
}
