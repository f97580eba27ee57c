// Statement typing and the company-concept to standard-concept mapper
use crate::cache::LockFreeCache;
use crate::config::ConceptOverride;
use crate::model::ConceptId;
use crate::xml::local_name;
use crate::Error;
use ahash::AHashMap;
use compact_str::CompactString;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    BalanceSheet,
    IncomeStatement,
    ComprehensiveIncome,
    CashFlowStatement,
    StatementOfEquity,
}

impl StatementType {
    pub const ALL: [StatementType; 5] = [
        StatementType::BalanceSheet,
        StatementType::IncomeStatement,
        StatementType::ComprehensiveIncome,
        StatementType::CashFlowStatement,
        StatementType::StatementOfEquity,
    ];

    /// Classifies an extended link role from its definition, or from the URI
    /// when no definition is known. Parentheticals, disclosures, policies and
    /// detail roles are not statements.
    pub fn classify_role(uri: &str, definition: Option<&str>) -> Option<Self> {
        let text = definition.unwrap_or(uri).to_lowercase();

        if let Some(definition) = definition {
            // "0002 - Statement - Balance Sheet": the middle part is the category
            let mut parts = definition.split(" - ");
            if let (Some(_), Some(category)) = (parts.next(), parts.next()) {
                let category = category.trim().to_lowercase();
                let is_category = !category.is_empty() && category.chars().all(char::is_alphabetic);
                if is_category && category != "statement" {
                    return None;
                }
            }
        }
        if text.contains("parenthetical") || text.contains("details") || text.contains("policies") {
            return None;
        }

        let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));
        if has(&[
            "comprehensive income",
            "comprehensiveincome",
            "comprehensive loss",
            "comprehensiveloss",
        ]) {
            if has(&["operations", "earnings", "income statement", "incomestatement"]) {
                return Some(StatementType::IncomeStatement);
            }
            return Some(StatementType::ComprehensiveIncome);
        }
        if has(&[
            "balance sheet",
            "balancesheet",
            "financial position",
            "financialposition",
            "financial condition",
            "financialcondition",
        ]) {
            return Some(StatementType::BalanceSheet);
        }
        if has(&["cash flow", "cashflow"]) {
            return Some(StatementType::CashFlowStatement);
        }
        if has(&["stockholders", "shareholders", "equity"]) {
            return Some(StatementType::StatementOfEquity);
        }
        if has(&["operations", "income", "earnings", "loss"]) {
            return Some(StatementType::IncomeStatement);
        }
        None
    }

    /// Balance sheets report instants; every other statement reports durations.
    pub fn prefers_instants(self) -> bool {
        self == StatementType::BalanceSheet
    }

    pub fn label(self) -> &'static str {
        match self {
            StatementType::BalanceSheet => "Balance Sheet",
            StatementType::IncomeStatement => "Income Statement",
            StatementType::ComprehensiveIncome => "Comprehensive Income",
            StatementType::CashFlowStatement => "Cash Flow Statement",
            StatementType::StatementOfEquity => "Statement of Equity",
        }
    }

    /// Candidate standard concepts, in tie-break order.
    pub fn standard_concepts(self) -> &'static [StandardConcept] {
        use StandardConcept::*;
        match self {
            StatementType::BalanceSheet => &[
                CashAndEquivalents,
                ShortTermInvestments,
                AccountsReceivable,
                Inventory,
                PrepaidExpenses,
                TotalCurrentAssets,
                PropertyPlantEquipment,
                Goodwill,
                IntangibleAssets,
                TotalAssets,
                AccountsPayable,
                AccruedLiabilities,
                ShortTermDebt,
                TotalCurrentLiabilities,
                LongTermDebt,
                TotalLiabilities,
                CommonStock,
                AdditionalPaidInCapital,
                RetainedEarnings,
                TotalStockholdersEquity,
                TotalLiabilitiesAndEquity,
            ],
            StatementType::IncomeStatement => &[
                Revenue,
                CostOfRevenue,
                GrossProfit,
                ResearchAndDevelopment,
                SellingGeneralAdministrative,
                OperatingExpenses,
                OperatingIncome,
                InterestExpense,
                OtherNonOperatingIncome,
                IncomeBeforeTax,
                IncomeTaxExpense,
                NetIncome,
                EpsBasic,
                EpsDiluted,
                SharesBasic,
                SharesDiluted,
            ],
            StatementType::ComprehensiveIncome => &[
                NetIncome,
                OtherComprehensiveIncome,
                ComprehensiveIncome,
            ],
            StatementType::CashFlowStatement => &[
                NetIncome,
                DepreciationAmortization,
                ShareBasedCompensation,
                NetCashFromOperating,
                CapitalExpenditures,
                NetCashFromInvesting,
                DividendsPaid,
                ShareRepurchases,
                NetCashFromFinancing,
                NetChangeInCash,
                CashAndEquivalents,
            ],
            StatementType::StatementOfEquity => &[
                TotalStockholdersEquity,
                CommonStock,
                AdditionalPaidInCapital,
                RetainedEarnings,
                NetIncome,
                OtherComprehensiveIncome,
                DividendsPaid,
                ShareRepurchases,
                ShareBasedCompensation,
            ],
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "balance" | "balance_sheet" | "bs" => Ok(StatementType::BalanceSheet),
            "income" | "income_statement" | "is" | "operations" => {
                Ok(StatementType::IncomeStatement)
            }
            "comprehensive" | "comprehensive_income" | "ci" => {
                Ok(StatementType::ComprehensiveIncome)
            }
            "cash" | "cash_flow" | "cash_flow_statement" | "cf" => {
                Ok(StatementType::CashFlowStatement)
            }
            "equity" | "statement_of_equity" | "se" => Ok(StatementType::StatementOfEquity),
            other => Err(Error::Config(format!("unknown statement type: {}", other))),
        }
    }
}

/// Cross-company line items statements are aligned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardConcept {
    // Balance sheet
    CashAndEquivalents,
    ShortTermInvestments,
    AccountsReceivable,
    Inventory,
    PrepaidExpenses,
    TotalCurrentAssets,
    PropertyPlantEquipment,
    Goodwill,
    IntangibleAssets,
    TotalAssets,
    AccountsPayable,
    AccruedLiabilities,
    ShortTermDebt,
    TotalCurrentLiabilities,
    LongTermDebt,
    TotalLiabilities,
    CommonStock,
    AdditionalPaidInCapital,
    RetainedEarnings,
    TotalStockholdersEquity,
    TotalLiabilitiesAndEquity,
    // Income statement
    Revenue,
    CostOfRevenue,
    GrossProfit,
    ResearchAndDevelopment,
    SellingGeneralAdministrative,
    OperatingExpenses,
    OperatingIncome,
    InterestExpense,
    OtherNonOperatingIncome,
    IncomeBeforeTax,
    IncomeTaxExpense,
    NetIncome,
    EpsBasic,
    EpsDiluted,
    SharesBasic,
    SharesDiluted,
    // Comprehensive income
    OtherComprehensiveIncome,
    ComprehensiveIncome,
    // Cash flow
    DepreciationAmortization,
    ShareBasedCompensation,
    NetCashFromOperating,
    CapitalExpenditures,
    NetCashFromInvesting,
    DividendsPaid,
    ShareRepurchases,
    NetCashFromFinancing,
    NetChangeInCash,
}

impl StandardConcept {
    pub fn label(self) -> &'static str {
        use StandardConcept::*;
        match self {
            CashAndEquivalents => "Cash and Cash Equivalents",
            ShortTermInvestments => "Short-Term Investments",
            AccountsReceivable => "Accounts Receivable",
            Inventory => "Inventory",
            PrepaidExpenses => "Prepaid Expenses",
            TotalCurrentAssets => "Total Current Assets",
            PropertyPlantEquipment => "Property, Plant and Equipment",
            Goodwill => "Goodwill",
            IntangibleAssets => "Intangible Assets",
            TotalAssets => "Total Assets",
            AccountsPayable => "Accounts Payable",
            AccruedLiabilities => "Accrued Liabilities",
            ShortTermDebt => "Short-Term Debt",
            TotalCurrentLiabilities => "Total Current Liabilities",
            LongTermDebt => "Long-Term Debt",
            TotalLiabilities => "Total Liabilities",
            CommonStock => "Common Stock",
            AdditionalPaidInCapital => "Additional Paid-In Capital",
            RetainedEarnings => "Retained Earnings",
            TotalStockholdersEquity => "Total Stockholders' Equity",
            TotalLiabilitiesAndEquity => "Total Liabilities and Equity",
            Revenue => "Revenue",
            CostOfRevenue => "Cost of Revenue",
            GrossProfit => "Gross Profit",
            ResearchAndDevelopment => "Research and Development",
            SellingGeneralAdministrative => "Selling, General and Administrative",
            OperatingExpenses => "Operating Expenses",
            OperatingIncome => "Operating Income",
            InterestExpense => "Interest Expense",
            OtherNonOperatingIncome => "Other Non-Operating Income",
            IncomeBeforeTax => "Income Before Tax",
            IncomeTaxExpense => "Income Tax Expense",
            NetIncome => "Net Income",
            EpsBasic => "Earnings Per Share (Basic)",
            EpsDiluted => "Earnings Per Share (Diluted)",
            SharesBasic => "Weighted Average Shares (Basic)",
            SharesDiluted => "Weighted Average Shares (Diluted)",
            OtherComprehensiveIncome => "Other Comprehensive Income",
            ComprehensiveIncome => "Comprehensive Income",
            DepreciationAmortization => "Depreciation and Amortization",
            ShareBasedCompensation => "Share-Based Compensation",
            NetCashFromOperating => "Net Cash from Operating Activities",
            CapitalExpenditures => "Capital Expenditures",
            NetCashFromInvesting => "Net Cash from Investing Activities",
            DividendsPaid => "Dividends Paid",
            ShareRepurchases => "Share Repurchases",
            NetCashFromFinancing => "Net Cash from Financing Activities",
            NetChangeInCash => "Net Change in Cash",
        }
    }

    /// Local names of taxonomy concepts reported for this line item.
    pub fn company_concepts(self) -> &'static [&'static str] {
        use StandardConcept::*;
        match self {
            CashAndEquivalents => &[
                "CashAndCashEquivalentsAtCarryingValue",
                "Cash",
                "CashAndDueFromBanks",
                "CashCashEquivalentsRestrictedCashAndRestrictedCashEquivalents",
            ],
            ShortTermInvestments => &[
                "ShortTermInvestments",
                "MarketableSecuritiesCurrent",
                "AvailableForSaleSecuritiesDebtSecuritiesCurrent",
            ],
            AccountsReceivable => &[
                "AccountsReceivableNetCurrent",
                "ReceivablesNetCurrent",
                "AccountsReceivableNet",
            ],
            Inventory => &["InventoryNet", "InventoryGross"],
            PrepaidExpenses => &["PrepaidExpenseCurrent", "PrepaidExpenseAndOtherAssetsCurrent"],
            TotalCurrentAssets => &["AssetsCurrent"],
            PropertyPlantEquipment => &[
                "PropertyPlantAndEquipmentNet",
                "PropertyPlantAndEquipmentAndFinanceLeaseRightOfUseAssetAfterAccumulatedDepreciationAndAmortization",
            ],
            Goodwill => &["Goodwill"],
            IntangibleAssets => &[
                "IntangibleAssetsNetExcludingGoodwill",
                "FiniteLivedIntangibleAssetsNet",
            ],
            TotalAssets => &["Assets"],
            AccountsPayable => &[
                "AccountsPayableCurrent",
                "AccountsPayableAndAccruedLiabilitiesCurrent",
            ],
            AccruedLiabilities => &[
                "AccruedLiabilitiesCurrent",
                "EmployeeRelatedLiabilitiesCurrent",
            ],
            ShortTermDebt => &[
                "ShortTermBorrowings",
                "LongTermDebtCurrent",
                "CommercialPaper",
                "DebtCurrent",
            ],
            TotalCurrentLiabilities => &["LiabilitiesCurrent"],
            LongTermDebt => &[
                "LongTermDebtNoncurrent",
                "LongTermDebt",
                "LongTermDebtAndCapitalLeaseObligations",
            ],
            TotalLiabilities => &["Liabilities"],
            CommonStock => &["CommonStockValue", "CommonStocksIncludingAdditionalPaidInCapital"],
            AdditionalPaidInCapital => &[
                "AdditionalPaidInCapital",
                "AdditionalPaidInCapitalCommonStock",
            ],
            RetainedEarnings => &["RetainedEarningsAccumulatedDeficit"],
            TotalStockholdersEquity => &[
                "StockholdersEquity",
                "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
            ],
            TotalLiabilitiesAndEquity => &["LiabilitiesAndStockholdersEquity"],
            Revenue => &[
                "Revenues",
                "RevenueFromContractWithCustomerExcludingAssessedTax",
                "RevenueFromContractWithCustomerIncludingAssessedTax",
                "SalesRevenueNet",
                "SalesRevenueGoodsNet",
            ],
            CostOfRevenue => &[
                "CostOfRevenue",
                "CostOfGoodsAndServicesSold",
                "CostOfGoodsSold",
                "CostOfServices",
            ],
            GrossProfit => &["GrossProfit"],
            ResearchAndDevelopment => &[
                "ResearchAndDevelopmentExpense",
                "ResearchAndDevelopmentExpenseExcludingAcquiredInProcessCost",
            ],
            SellingGeneralAdministrative => &[
                "SellingGeneralAndAdministrativeExpense",
                "GeneralAndAdministrativeExpense",
                "SellingAndMarketingExpense",
            ],
            OperatingExpenses => &["OperatingExpenses", "CostsAndExpenses"],
            OperatingIncome => &["OperatingIncomeLoss"],
            InterestExpense => &["InterestExpense", "InterestExpenseNonoperating"],
            OtherNonOperatingIncome => &[
                "NonoperatingIncomeExpense",
                "OtherNonoperatingIncomeExpense",
            ],
            IncomeBeforeTax => &[
                "IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
                "IncomeLossFromContinuingOperationsBeforeIncomeTaxesMinorityInterestAndIncomeLossFromEquityMethodInvestments",
            ],
            IncomeTaxExpense => &["IncomeTaxExpenseBenefit"],
            NetIncome => &[
                "NetIncomeLoss",
                "ProfitLoss",
                "NetIncomeLossAvailableToCommonStockholdersBasic",
            ],
            EpsBasic => &["EarningsPerShareBasic", "EarningsPerShareBasicAndDiluted"],
            EpsDiluted => &["EarningsPerShareDiluted"],
            SharesBasic => &["WeightedAverageNumberOfSharesOutstandingBasic"],
            SharesDiluted => &["WeightedAverageNumberOfDilutedSharesOutstanding"],
            OtherComprehensiveIncome => &[
                "OtherComprehensiveIncomeLossNetOfTax",
                "OtherComprehensiveIncomeLossNetOfTaxPortionAttributableToParent",
            ],
            ComprehensiveIncome => &[
                "ComprehensiveIncomeNetOfTax",
                "ComprehensiveIncomeNetOfTaxIncludingPortionAttributableToNoncontrollingInterest",
            ],
            DepreciationAmortization => &[
                "DepreciationDepletionAndAmortization",
                "DepreciationAndAmortization",
                "Depreciation",
            ],
            ShareBasedCompensation => &[
                "ShareBasedCompensation",
                "AllocatedShareBasedCompensationExpense",
                "AdjustmentsToAdditionalPaidInCapitalSharebasedCompensationRequisiteServicePeriodRecognitionValue",
            ],
            NetCashFromOperating => &[
                "NetCashProvidedByUsedInOperatingActivities",
                "NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
            ],
            CapitalExpenditures => &[
                "PaymentsToAcquirePropertyPlantAndEquipment",
                "PaymentsToAcquireProductiveAssets",
            ],
            NetCashFromInvesting => &[
                "NetCashProvidedByUsedInInvestingActivities",
                "NetCashProvidedByUsedInInvestingActivitiesContinuingOperations",
            ],
            DividendsPaid => &[
                "PaymentsOfDividends",
                "PaymentsOfDividendsCommonStock",
                "DividendsCommonStock",
                "DividendsCommonStockCash",
            ],
            ShareRepurchases => &[
                "PaymentsForRepurchaseOfCommonStock",
                "StockRepurchasedDuringPeriodValue",
            ],
            NetCashFromFinancing => &[
                "NetCashProvidedByUsedInFinancingActivities",
                "NetCashProvidedByUsedInFinancingActivitiesContinuingOperations",
            ],
            NetChangeInCash => &[
                "CashCashEquivalentsRestrictedCashAndRestrictedCashEquivalentsPeriodIncreaseDecreaseIncludingExchangeRateEffect",
                "CashAndCashEquivalentsPeriodIncreaseDecrease",
            ],
        }
    }

    /// Label keyword sets: a set matches when the lowercased label contains
    /// every term in it.
    pub fn keywords(self) -> &'static [&'static [&'static str]] {
        use StandardConcept::*;
        match self {
            CashAndEquivalents => &[
                &["cash and cash equivalents"],
                &["cash and equivalents"],
                &["cash, cash equivalents"],
            ],
            ShortTermInvestments => &[
                &["short-term investments"],
                &["short term investments"],
                &["marketable securities"],
            ],
            AccountsReceivable => &[
                &["accounts receivable"],
                &["trade receivables"],
                &["receivables"],
            ],
            Inventory => &[&["inventories"], &["inventory"]],
            PrepaidExpenses => &[&["prepaid"]],
            TotalCurrentAssets => &[&["total current assets"]],
            PropertyPlantEquipment => &[
                &["property, plant and equipment"],
                &["property, plant, and equipment"],
                &["property and equipment"],
            ],
            Goodwill => &[&["goodwill"]],
            IntangibleAssets => &[&["intangible assets"]],
            TotalAssets => &[&["total assets"]],
            AccountsPayable => &[&["accounts payable"]],
            AccruedLiabilities => &[&["accrued liabilities"], &["accrued expenses"]],
            ShortTermDebt => &[
                &["short-term debt"],
                &["short-term borrowings"],
                &["current portion of long-term debt"],
                &["commercial paper"],
            ],
            TotalCurrentLiabilities => &[&["total current liabilities"]],
            LongTermDebt => &[&["long-term debt"], &["long term debt"]],
            TotalLiabilities => &[&["total liabilities"]],
            CommonStock => &[&["common stock"]],
            AdditionalPaidInCapital => &[
                &["additional paid-in capital"],
                &["additional paid in capital"],
            ],
            RetainedEarnings => &[&["retained earnings"], &["accumulated deficit"]],
            TotalStockholdersEquity => &[
                &["total stockholders"],
                &["total shareholders"],
                &["total equity"],
            ],
            TotalLiabilitiesAndEquity => &[
                &["total liabilities and", "equity"],
                &["liabilities and stockholders"],
            ],
            Revenue => &[&["revenue"], &["net sales"], &["total sales"]],
            CostOfRevenue => &[
                &["cost of revenue"],
                &["cost of sales"],
                &["cost of goods sold"],
                &["cost of products"],
                &["cost of services"],
            ],
            GrossProfit => &[&["gross profit"], &["gross margin"]],
            ResearchAndDevelopment => &[&["research and development"], &["research & development"]],
            SellingGeneralAdministrative => &[
                &["selling, general and administrative"],
                &["general and administrative"],
                &["sales and marketing"],
                &["selling and marketing"],
            ],
            OperatingExpenses => &[
                &["total operating expenses"],
                &["operating expenses"],
                &["costs and expenses"],
            ],
            OperatingIncome => &[
                &["operating income"],
                &["income from operations"],
                &["operating loss"],
                &["loss from operations"],
            ],
            InterestExpense => &[&["interest expense"]],
            OtherNonOperatingIncome => &[
                &["other income"],
                &["other expense"],
                &["nonoperating"],
                &["non-operating"],
            ],
            IncomeBeforeTax => &[
                &["before income taxes"],
                &["before provision for income taxes"],
                &["before taxes"],
            ],
            IncomeTaxExpense => &[
                &["provision for income taxes"],
                &["income tax expense"],
                &["income taxes"],
            ],
            NetIncome => &[&["net income"], &["net earnings"], &["net loss"]],
            EpsBasic => &[&["per share", "basic"], &["basic earnings per share"]],
            EpsDiluted => &[&["per share", "diluted"], &["diluted earnings per share"]],
            SharesBasic => &[&["shares", "basic"], &["weighted", "basic"]],
            SharesDiluted => &[&["shares", "diluted"], &["weighted", "diluted"]],
            OtherComprehensiveIncome => &[
                &["other comprehensive income"],
                &["other comprehensive"],
            ],
            ComprehensiveIncome => &[&["comprehensive income"]],
            DepreciationAmortization => &[&["depreciation"], &["amortization"]],
            ShareBasedCompensation => &[
                &["stock-based compensation"],
                &["share-based compensation"],
                &["stock based compensation"],
                &["share based compensation"],
            ],
            NetCashFromOperating => &[&["operating activities"]],
            CapitalExpenditures => &[
                &["capital expenditures"],
                &["purchases of property"],
                &["purchase of property"],
                &["payments for acquisition of property"],
            ],
            NetCashFromInvesting => &[&["investing activities"]],
            DividendsPaid => &[&["dividends"]],
            ShareRepurchases => &[&["repurchase"], &["buyback"], &["treasury stock"]],
            NetCashFromFinancing => &[&["financing activities"]],
            NetChangeInCash => &[
                &["increase", "cash and cash equivalents"],
                &["decrease", "cash and cash equivalents"],
                &["increase", "cash, cash equivalents"],
                &["decrease", "cash, cash equivalents"],
                &["change in cash"],
            ],
        }
    }
}

impl fmt::Display for StandardConcept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatchKey {
    entity: CompactString,
    statement_type: StatementType,
    concept: ConceptId,
    label: String,
}

type Scoped = (StatementType, StandardConcept);

/// Maps company concepts onto [`StandardConcept`]s.
///
/// The curated tables are immutable. Two pieces of state are shared across
/// filings: learned mappings (explicit, first writer wins, never rewritten)
/// and a cache of previous match results, negatives included. Both only grow,
/// so concurrent assembly of independent filings can share one mapper.
pub struct ConceptMapper {
    exact: AHashMap<&'static str, Vec<Scoped>>,
    folded: AHashMap<String, Vec<Scoped>>,
    learned: RwLock<AHashMap<(StatementType, CompactString), StandardConcept>>,
    matches: LockFreeCache<MatchKey, Option<StandardConcept>>,
}

impl Default for ConceptMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ConceptMapper {
    pub fn new() -> Self {
        let mut exact: AHashMap<&'static str, Vec<Scoped>> = AHashMap::new();
        let mut folded: AHashMap<String, Vec<Scoped>> = AHashMap::new();
        for statement_type in StatementType::ALL {
            for &standard in statement_type.standard_concepts() {
                for &name in standard.company_concepts() {
                    exact.entry(name).or_default().push((statement_type, standard));
                    folded.entry(name.to_lowercase()).or_default().push((statement_type, standard));
                }
            }
        }
        Self {
            exact,
            folded,
            learned: RwLock::new(AHashMap::new()),
            matches: LockFreeCache::new(1 << 16),
        }
    }

    pub fn with_overrides(overrides: &[ConceptOverride]) -> Self {
        let mapper = Self::new();
        for o in overrides {
            mapper.learn(o.statement_type, &o.concept, o.standard);
        }
        mapper
    }

    /// Records a company-specific mapping. An existing mapping for the same
    /// concept is kept; the effective mapping is returned.
    pub fn learn(
        &self,
        statement_type: StatementType,
        concept: &str,
        standard: StandardConcept,
    ) -> StandardConcept {
        let mut learned = self.learned.write();
        *learned
            .entry((statement_type, CompactString::from(concept)))
            .or_insert(standard)
    }

    pub fn learned(&self, statement_type: StatementType, concept: &str) -> Option<StandardConcept> {
        let learned = self.learned.read();
        learned
            .get(&(statement_type, CompactString::from(concept)))
            .or_else(|| learned.get(&(statement_type, CompactString::from(local_name(concept)))))
            .copied()
    }

    /// Uncached lookup: learned mappings, exact name, case-insensitive name,
    /// then label keywords.
    pub fn map(
        &self,
        concept: &str,
        label: &str,
        statement_type: StatementType,
    ) -> Option<StandardConcept> {
        if let Some(standard) = self.learned(statement_type, concept) {
            return Some(standard);
        }
        let name = local_name(concept);
        let scoped = |candidates: Option<&Vec<Scoped>>| {
            candidates?
                .iter()
                .find(|(scope, _)| *scope == statement_type)
                .map(|&(_, standard)| standard)
        };
        scoped(self.exact.get(name))
            .or_else(|| scoped(self.folded.get(name.to_lowercase().as_str())))
            .or_else(|| match_keywords(label, statement_type))
    }

    /// Starts a mapping pass for one company and statement type.
    pub fn pass(&self, entity: &str, statement_type: StatementType) -> MappingPass<'_> {
        MappingPass {
            mapper: self,
            entity: CompactString::from(entity),
            statement_type,
        }
    }

    pub fn cached(&self) -> usize {
        self.matches.len()
    }
}

/// Cached mapping for one company and statement type.
pub struct MappingPass<'m> {
    mapper: &'m ConceptMapper,
    entity: CompactString,
    statement_type: StatementType,
}

impl MappingPass<'_> {
    pub fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    pub fn map(&self, concept: &str, label: &str) -> Option<StandardConcept> {
        if let Some(standard) = self.mapper.learned(self.statement_type, concept) {
            return Some(standard);
        }
        let key = MatchKey {
            entity: self.entity.clone(),
            statement_type: self.statement_type,
            concept: CompactString::from(concept),
            label: label.to_string(),
        };
        if let Some(hit) = self.mapper.matches.get(&key) {
            return hit;
        }
        let result = self.mapper.map(concept, label, self.statement_type);
        self.mapper.matches.insert(key, result)
    }
}

/// Longest total keyword match wins; ties go to the earlier table entry.
fn match_keywords(label: &str, statement_type: StatementType) -> Option<StandardConcept> {
    let label = label.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
    let mut best: Option<(usize, StandardConcept)> = None;

    for &standard in statement_type.standard_concepts() {
        let score = standard
            .keywords()
            .iter()
            .filter(|terms| terms.iter().all(|term| label.contains(term)))
            .map(|terms| terms.iter().map(|term| term.len()).sum::<usize>())
            .max();
        if let Some(score) = score {
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, standard));
            }
        }
    }
    best.map(|(_, standard)| standard)
}
