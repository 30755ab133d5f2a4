//! Column resolution: maps unknown source headers onto semantic roles.
//!
//! Each role gets a default proposed by keyword matching ([`auto_detect`]);
//! the operator then confirms it (empty answer) or types a column name. An
//! invalid answer earns exactly one more attempt. The exchange is a small
//! state machine ([`ResolutionState`]) so it behaves identically with a
//! scripted operator and a human one.

use log::{debug, info};

use crate::{
    config::AuditConfig,
    error::{AuditError, AuditResult},
    mapping::{FarmerColumns, SchemaMapping, TransactionColumns},
    prompt::{Operator, PromptRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSide {
    Farmers,
    Transactions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    FarmerIdFarmers,
    FarmerIdTransactions,
    FarmerName,
    LandSize,
    TransactionId,
    DealerId,
    Quantity,
    Village,
}

impl Role {
    /// Order in which roles are put to the operator.
    pub const RESOLUTION_ORDER: [Role; 8] = [
        Role::FarmerIdFarmers,
        Role::FarmerIdTransactions,
        Role::FarmerName,
        Role::LandSize,
        Role::TransactionId,
        Role::DealerId,
        Role::Quantity,
        Role::Village,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Role::FarmerIdFarmers => "FarmerID (farmers file)",
            Role::FarmerIdTransactions => "FarmerID (transactions file)",
            Role::FarmerName => "Name (farmers file) [optional]",
            Role::LandSize => "LandSize / area (farmers file)",
            Role::TransactionId => "TransactionID (transactions file)",
            Role::DealerId => "DealerID (transactions file)",
            Role::Quantity => "Quantity (transactions file) (kg)",
            Role::Village => "VillageID/Name (transactions file) [optional]",
        }
    }

    pub fn side(self) -> DatasetSide {
        match self {
            Role::FarmerIdFarmers | Role::FarmerName | Role::LandSize => DatasetSide::Farmers,
            _ => DatasetSide::Transactions,
        }
    }

    /// Key used for keyword overrides in the configuration file. Both farmer
    /// identity roles share one keyword list.
    pub fn keyword_key(self) -> &'static str {
        match self {
            Role::FarmerIdFarmers | Role::FarmerIdTransactions => "farmer_id",
            Role::FarmerName => "name",
            Role::LandSize => "land",
            Role::TransactionId => "transaction_id",
            Role::DealerId => "dealer_id",
            Role::Quantity => "quantity",
            Role::Village => "village",
        }
    }

    pub fn from_keyword_key(key: &str) -> Option<Role> {
        Role::RESOLUTION_ORDER
            .into_iter()
            .find(|role| role.keyword_key() == key)
    }

    pub fn default_keywords(self) -> &'static [&'static str] {
        match self {
            Role::FarmerIdFarmers | Role::FarmerIdTransactions => {
                &["farmerid", "farmer_id", "id", "farmer"]
            }
            Role::FarmerName => &["name", "farmer_name"],
            Role::LandSize => &["land", "acre", "area"],
            Role::TransactionId => &[
                "transactionid",
                "txn",
                "tran_id",
                "transaction_id",
                "transaction",
            ],
            Role::DealerId => &["dealerid", "dealer_id", "dealer"],
            Role::Quantity => &["quantity", "quantity_kg", "qty", "kg"],
            Role::Village => &["village", "villageid", "village_id", "village_name"],
        }
    }
}

/// Returns the first column containing a keyword, trying keywords in priority
/// order and, for each keyword, columns in their original order.
pub fn auto_detect<'a, S: AsRef<str>>(columns: &'a [String], keywords: &[S]) -> Option<&'a str> {
    let lowered = columns
        .iter()
        .map(|column| column.to_lowercase())
        .collect::<Vec<_>>();
    keywords.iter().find_map(|keyword| {
        let keyword = keyword.as_ref().to_lowercase();
        columns
            .iter()
            .zip(&lowered)
            .find(|(_, low)| low.contains(&keyword))
            .map(|(column, _)| column.as_str())
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Prompt,
    Validate { answer: String, retried: bool },
    Retry { rejected: String },
    Resolved(String),
    Failed(String),
}

pub struct ColumnResolver<'c, O> {
    operator: O,
    config: &'c AuditConfig,
}

impl<'c, O: Operator> ColumnResolver<'c, O> {
    pub fn new(operator: O, config: &'c AuditConfig) -> Self {
        Self { operator, config }
    }

    pub fn into_operator(self) -> O {
        self.operator
    }

    /// Default column the keyword table proposes for `role`.
    pub fn detect_default<'a>(&self, role: Role, columns: &'a [String]) -> Option<&'a str> {
        auto_detect(columns, &self.config.keywords_for(role))
    }

    /// Runs the prompt/validate exchange for one role. The default is the
    /// first candidate present in `columns`. Only a member of `columns` can
    /// come back as `Ok`.
    pub fn resolve_role(
        &mut self,
        role: &str,
        columns: &[String],
        candidate_defaults: &[&str],
    ) -> AuditResult<String> {
        let default = candidate_defaults
            .iter()
            .copied()
            .find(|candidate| columns.iter().any(|column| column == candidate));
        let mut state = ResolutionState::Prompt;
        loop {
            state = match state {
                ResolutionState::Prompt => {
                    let answer = self.operator.respond(&PromptRequest {
                        role,
                        columns,
                        default,
                        rejected: None,
                    })?;
                    ResolutionState::Validate {
                        answer,
                        retried: false,
                    }
                }
                ResolutionState::Retry { rejected } => {
                    let answer = self.operator.respond(&PromptRequest {
                        role,
                        columns,
                        default,
                        rejected: Some(rejected.as_str()),
                    })?;
                    ResolutionState::Validate {
                        answer,
                        retried: true,
                    }
                }
                ResolutionState::Validate { answer, retried } => {
                    let choice = match (answer.is_empty(), default) {
                        (true, Some(default)) => default.to_string(),
                        _ => answer,
                    };
                    // An empty answer without a default is a failed attempt,
                    // even when a header is blank.
                    if !choice.is_empty() && columns.contains(&choice) {
                        ResolutionState::Resolved(choice)
                    } else if retried {
                        ResolutionState::Failed(choice)
                    } else {
                        ResolutionState::Retry { rejected: choice }
                    }
                }
                ResolutionState::Resolved(column) => {
                    debug!("Resolved '{role}' to column '{column}'");
                    return Ok(column);
                }
                ResolutionState::Failed(value) => {
                    return Err(AuditError::InvalidColumnSelection {
                        role: role.to_string(),
                        value,
                    });
                }
            };
        }
    }

    pub fn resolve_required(&mut self, role: Role, columns: &[String]) -> AuditResult<String> {
        let detected = self.detect_default(role, columns);
        let candidates = detected.into_iter().collect::<Vec<_>>();
        self.resolve_role(role.label(), columns, &candidates)
    }

    /// Like [`Self::resolve_required`], but a failed selection leaves the role
    /// unset instead of aborting.
    pub fn resolve_optional(
        &mut self,
        role: Role,
        columns: &[String],
    ) -> AuditResult<Option<String>> {
        match self.resolve_required(role, columns) {
            Ok(column) => Ok(Some(column)),
            Err(AuditError::InvalidColumnSelection { value, .. }) => {
                info!("Optional role '{}' left unset (answer '{value}')", role.label());
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    /// Resolves every role in [`Role::RESOLUTION_ORDER`].
    pub fn resolve_mapping(
        &mut self,
        farmer_columns: &[String],
        transaction_columns: &[String],
    ) -> AuditResult<SchemaMapping> {
        let farmer_id = self.resolve_required(Role::FarmerIdFarmers, farmer_columns)?;
        let transaction_farmer_id =
            self.resolve_required(Role::FarmerIdTransactions, transaction_columns)?;
        let name = self.resolve_optional(Role::FarmerName, farmer_columns)?;
        let land = self.resolve_required(Role::LandSize, farmer_columns)?;
        let transaction_id = self.resolve_required(Role::TransactionId, transaction_columns)?;
        let dealer_id = self.resolve_required(Role::DealerId, transaction_columns)?;
        let quantity = self.resolve_required(Role::Quantity, transaction_columns)?;
        let village = self.resolve_optional(Role::Village, transaction_columns)?;

        let mapping = SchemaMapping {
            farmers: FarmerColumns {
                farmer_id,
                name,
                land,
            },
            transactions: TransactionColumns {
                farmer_id: transaction_farmer_id,
                transaction_id,
                dealer_id,
                quantity,
                village,
            },
        };
        info!("Column mapping established");
        for (role, column) in mapping.entries() {
            debug!("  {role} -> {}", column.unwrap_or("<unset>"));
        }
        Ok(mapping)
    }
}
