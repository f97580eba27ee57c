#![allow(dead_code)]

use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use stitchrl::{FilingMeta, FilingSources};

pub const BALANCE_SHEET_ROLE: &str = "http://acme.example/role/BalanceSheet";
pub const BALANCE_SHEET_PARENTHETICAL_ROLE: &str =
    "http://acme.example/role/BalanceSheetParenthetical";
pub const INCOME_STATEMENT_ROLE: &str = "http://acme.example/role/IncomeStatement";

/// Reported amounts for one fiscal year, in dollars.
#[derive(Debug, Clone, Copy)]
pub struct Figures {
    pub revenue: i64,
    pub cost: i64,
    pub opex: i64,
    pub royalties: i64,
    pub cash: i64,
    pub receivables: i64,
    pub liabilities: i64,
}

impl Figures {
    pub fn for_year(year: i32) -> Self {
        let step = i64::from(year - 2020);
        Self {
            revenue: 1_000_000_000 + step * 100_000_000,
            cost: 600_000_000 + step * 50_000_000,
            opex: 200_000_000,
            royalties: 5_000_000,
            cash: 300_000_000 + step * 20_000_000,
            receivables: 150_000_000,
            liabilities: 250_000_000,
        }
    }

    pub fn with_revenue(mut self, revenue: i64) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn gross_profit(&self) -> i64 {
        self.revenue - self.cost
    }

    pub fn operating_income(&self) -> i64 {
        self.gross_profit() - self.opex
    }

    pub fn assets(&self) -> i64 {
        self.cash + self.receivables
    }

    pub fn equity(&self) -> i64 {
        self.assets() - self.liabilities
    }
}

/// The documents of one annual filing for fiscal year `year`, which also
/// reports the prior year as comparative.
pub struct Fixture {
    pub year: i32,
    pub instance: String,
    pub schema: String,
    pub presentation: String,
    pub calculation: String,
    pub labels: String,
    pub meta: FilingMeta,
}

impl Fixture {
    pub fn annual(year: i32, current: Figures, prior: Figures) -> Self {
        Self {
            year,
            instance: instance(year, current, prior),
            schema: SCHEMA.to_string(),
            presentation: PRESENTATION.to_string(),
            calculation: CALCULATION.to_string(),
            labels: LABELS.to_string(),
            meta: FilingMeta {
                accession: Some(format!("0000000001-{}-000010", year % 100 + 1)),
                form: Some("10-K".to_string()),
                filing_date: NaiveDate::from_ymd_opt(year + 1, 2, 15),
            },
        }
    }

    /// Filing for `year` with figures derived from the year alone.
    pub fn standard(year: i32) -> Self {
        Self::annual(year, Figures::for_year(year), Figures::for_year(year - 1))
    }

    pub fn sources(&self) -> FilingSources<'_> {
        FilingSources::new(self.instance.as_bytes())
            .with_schema(self.schema.as_bytes())
            .with_linkbase(self.presentation.as_bytes())
            .with_linkbase(self.calculation.as_bytes())
            .with_linkbase(self.labels.as_bytes())
            .with_meta(self.meta.clone())
    }

    /// Lays the filing out the way EDGAR archives name the documents.
    pub fn write_to(&self, dir: &Path) {
        let stem = format!("acme-{}1231", self.year);
        fs::write(dir.join(format!("{}.xml", stem)), &self.instance).unwrap();
        fs::write(dir.join(format!("{}.xsd", stem)), &self.schema).unwrap();
        fs::write(dir.join(format!("{}_pre.xml", stem)), &self.presentation).unwrap();
        fs::write(dir.join(format!("{}_cal.xml", stem)), &self.calculation).unwrap();
        fs::write(dir.join(format!("{}_lab.xml", stem)), &self.labels).unwrap();
        fs::write(dir.join("filing.json"), serde_json::to_string(&self.meta).unwrap()).unwrap();
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn context(id: &str, period: &str, segment: &str) -> String {
    format!(
        r#"  <xbrli:context id="{id}">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0000000001</xbrli:identifier>{segment}
    </xbrli:entity>
    <xbrli:period>{period}</xbrli:period>
  </xbrli:context>
"#
    )
}

fn duration(year: i32) -> String {
    format!(
        "<xbrli:startDate>{year}-01-01</xbrli:startDate>\
         <xbrli:endDate>{year}-12-31</xbrli:endDate>"
    )
}

fn instant(year: i32) -> String {
    format!("<xbrli:instant>{year}-12-31</xbrli:instant>")
}

fn monetary(concept: &str, context: &str, value: i64) -> String {
    format!(
        "  <{concept} contextRef=\"{context}\" unitRef=\"usd\" \
         decimals=\"-6\">{value}</{concept}>\n"
    )
}

fn instance(year: i32, current: Figures, prior: Figures) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:link="http://www.xbrl.org/2003/linkbase"
            xmlns:xlink="http://www.w3.org/1999/xlink"
            xmlns:iso4217="http://www.xbrl.org/2003/iso4217"
            xmlns:xbrldi="http://xbrl.org/2006/xbrldi"
            xmlns:dei="http://xbrl.sec.gov/dei/2023"
            xmlns:us-gaap="http://fasb.org/us-gaap/2023"
            xmlns:acme="http://acme.example/2023">
  <link:schemaRef xlink:type="simple" xlink:href="acme.xsd"/>
"#,
    );

    let segment = r#"
      <xbrli:segment><xbrldi:explicitMember dimension="us-gaap:StatementBusinessSegmentsAxis">acme:WidgetsMember</xbrldi:explicitMember></xbrli:segment>"#;
    for (offset, figures) in [(0, current), (1, prior)] {
        let y = year - offset;
        let fy = format!("FY{y}");
        let at = format!("I{y}");
        xml.push_str(&context(&fy, &duration(y), ""));
        xml.push_str(&context(&at, &instant(y), ""));
        xml.push_str(&context(&format!("FY{y}_Widgets"), &duration(y), segment));

        xml.push_str(&monetary("us-gaap:Revenues", &fy, figures.revenue));
        xml.push_str(&monetary("us-gaap:Revenues", &format!("FY{y}_Widgets"), figures.revenue / 2));
        xml.push_str(&monetary("us-gaap:CostOfRevenue", &fy, figures.cost));
        xml.push_str(&monetary("us-gaap:GrossProfit", &fy, figures.gross_profit()));
        xml.push_str(&monetary("us-gaap:OperatingExpenses", &fy, figures.opex));
        xml.push_str(&monetary("acme:WidgetRoyalties", &fy, figures.royalties));
        xml.push_str(&monetary("us-gaap:OperatingIncomeLoss", &fy, figures.operating_income()));

        xml.push_str(&monetary("us-gaap:CashAndCashEquivalentsAtCarryingValue", &at, figures.cash));
        xml.push_str(&monetary("us-gaap:AccountsReceivableNetCurrent", &at, figures.receivables));
        xml.push_str(&monetary("us-gaap:Assets", &at, figures.assets()));
        xml.push_str(&monetary("us-gaap:Liabilities", &at, figures.liabilities));
        xml.push_str(&monetary("us-gaap:StockholdersEquity", &at, figures.equity()));
        xml.push_str(&monetary("us-gaap:LiabilitiesAndStockholdersEquity", &at, figures.assets()));
    }

    xml.push_str(&format!(
        r#"  <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
  <dei:EntityRegistrantName contextRef="FY{year}">Acme Corp</dei:EntityRegistrantName>
  <dei:EntityCentralIndexKey contextRef="FY{year}">0000000001</dei:EntityCentralIndexKey>
  <dei:DocumentType contextRef="FY{year}">10-K</dei:DocumentType>
  <dei:DocumentFiscalYearFocus contextRef="FY{year}">{year}</dei:DocumentFiscalYearFocus>
</xbrli:xbrl>
"#
    ));
    xml
}

const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:xbrli="http://www.xbrl.org/2003/instance"
           xmlns:link="http://www.xbrl.org/2003/linkbase"
           xmlns:acme="http://acme.example/2023"
           targetNamespace="http://acme.example/2023">
  <xs:annotation>
    <xs:appinfo>
      <link:roleType roleURI="http://acme.example/role/BalanceSheet" id="BalanceSheet">
        <link:definition>0002 - Statement - Consolidated Balance Sheets</link:definition>
        <link:usedOn>link:presentationLink</link:usedOn>
        <link:usedOn>link:calculationLink</link:usedOn>
      </link:roleType>
      <link:roleType roleURI="http://acme.example/role/BalanceSheetParenthetical" id="BalanceSheetParenthetical">
        <link:definition>0003 - Statement - Consolidated Balance Sheets (Parenthetical)</link:definition>
        <link:usedOn>link:presentationLink</link:usedOn>
      </link:roleType>
      <link:roleType roleURI="http://acme.example/role/IncomeStatement" id="IncomeStatement">
        <link:definition>0004 - Statement - Consolidated Statements of Operations</link:definition>
        <link:usedOn>link:presentationLink</link:usedOn>
        <link:usedOn>link:calculationLink</link:usedOn>
      </link:roleType>
    </xs:appinfo>
  </xs:annotation>
  <xs:element id="us-gaap_BalanceSheetAbstract" name="BalanceSheetAbstract" type="xbrli:stringItemType" substitutionGroup="xbrli:item" abstract="true" xbrli:periodType="duration"/>
  <xs:element id="us-gaap_IncomeStatementAbstract" name="IncomeStatementAbstract" type="xbrli:stringItemType" substitutionGroup="xbrli:item" abstract="true" xbrli:periodType="duration"/>
  <xs:element id="us-gaap_CashAndCashEquivalentsAtCarryingValue" name="CashAndCashEquivalentsAtCarryingValue" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="debit" xbrli:periodType="instant"/>
  <xs:element id="us-gaap_AccountsReceivableNetCurrent" name="AccountsReceivableNetCurrent" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="debit" xbrli:periodType="instant"/>
  <xs:element id="us-gaap_Assets" name="Assets" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="debit" xbrli:periodType="instant"/>
  <xs:element id="us-gaap_Liabilities" name="Liabilities" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="credit" xbrli:periodType="instant"/>
  <xs:element id="us-gaap_StockholdersEquity" name="StockholdersEquity" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="credit" xbrli:periodType="instant"/>
  <xs:element id="us-gaap_LiabilitiesAndStockholdersEquity" name="LiabilitiesAndStockholdersEquity" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="credit" xbrli:periodType="instant"/>
  <xs:element id="us-gaap_Revenues" name="Revenues" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="credit" xbrli:periodType="duration"/>
  <xs:element id="us-gaap_CostOfRevenue" name="CostOfRevenue" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="debit" xbrli:periodType="duration"/>
  <xs:element id="us-gaap_GrossProfit" name="GrossProfit" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="credit" xbrli:periodType="duration"/>
  <xs:element id="us-gaap_OperatingExpenses" name="OperatingExpenses" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="debit" xbrli:periodType="duration"/>
  <xs:element id="us-gaap_OperatingIncomeLoss" name="OperatingIncomeLoss" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="credit" xbrli:periodType="duration"/>
  <xs:element id="acme_WidgetRoyalties" name="WidgetRoyalties" type="xbrli:monetaryItemType" substitutionGroup="xbrli:item" xbrli:balance="credit" xbrli:periodType="duration"/>
</xs:schema>
"#;

const PRESENTATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
               xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:roleRef roleURI="http://acme.example/role/BalanceSheet" xlink:type="simple" xlink:href="acme.xsd#BalanceSheet"/>
  <link:roleRef roleURI="http://acme.example/role/IncomeStatement" xlink:type="simple" xlink:href="acme.xsd#IncomeStatement"/>
  <link:presentationLink xlink:type="extended" xlink:role="http://acme.example/role/BalanceSheet">
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_BalanceSheetAbstract" xlink:label="loc_bs"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_CashAndCashEquivalentsAtCarryingValue" xlink:label="loc_cash"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_AccountsReceivableNetCurrent" xlink:label="loc_ar"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_Assets" xlink:label="loc_assets"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_Liabilities" xlink:label="loc_liabilities"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_StockholdersEquity" xlink:label="loc_equity"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_LiabilitiesAndStockholdersEquity" xlink:label="loc_le"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_bs" xlink:to="loc_cash" order="1"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_bs" xlink:to="loc_ar" order="2"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_bs" xlink:to="loc_assets" order="3" preferredLabel="http://www.xbrl.org/2003/role/totalLabel"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_bs" xlink:to="loc_liabilities" order="4"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_bs" xlink:to="loc_equity" order="5"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_bs" xlink:to="loc_le" order="6" preferredLabel="http://www.xbrl.org/2003/role/totalLabel"/>
  </link:presentationLink>
  <link:presentationLink xlink:type="extended" xlink:role="http://acme.example/role/BalanceSheetParenthetical">
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_BalanceSheetAbstract" xlink:label="loc_bs"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_AccountsReceivableNetCurrent" xlink:label="loc_ar"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_bs" xlink:to="loc_ar" order="1"/>
  </link:presentationLink>
  <link:presentationLink xlink:type="extended" xlink:role="http://acme.example/role/IncomeStatement">
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_IncomeStatementAbstract" xlink:label="loc_is"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_Revenues" xlink:label="loc_revenue"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_CostOfRevenue" xlink:label="loc_cost"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_GrossProfit" xlink:label="loc_gross"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_OperatingExpenses" xlink:label="loc_opex"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#acme_WidgetRoyalties" xlink:label="loc_royalties"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_OperatingIncomeLoss" xlink:label="loc_opinc"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_is" xlink:to="loc_revenue" order="1"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_is" xlink:to="loc_cost" order="2"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_is" xlink:to="loc_gross" order="3" preferredLabel="http://www.xbrl.org/2003/role/totalLabel"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_is" xlink:to="loc_opex" order="4"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_is" xlink:to="loc_royalties" order="5"/>
    <link:presentationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" xlink:from="loc_is" xlink:to="loc_opinc" order="6"/>
  </link:presentationLink>
</link:linkbase>
"#;

const CALCULATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
               xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:calculationLink xlink:type="extended" xlink:role="http://acme.example/role/BalanceSheet">
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_CashAndCashEquivalentsAtCarryingValue" xlink:label="loc_cash"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_AccountsReceivableNetCurrent" xlink:label="loc_ar"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_Assets" xlink:label="loc_assets"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_Liabilities" xlink:label="loc_liabilities"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_StockholdersEquity" xlink:label="loc_equity"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_LiabilitiesAndStockholdersEquity" xlink:label="loc_le"/>
    <link:calculationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item" xlink:from="loc_assets" xlink:to="loc_cash" order="1" weight="1"/>
    <link:calculationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item" xlink:from="loc_assets" xlink:to="loc_ar" order="2" weight="1"/>
    <link:calculationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item" xlink:from="loc_le" xlink:to="loc_liabilities" order="1" weight="1"/>
    <link:calculationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item" xlink:from="loc_le" xlink:to="loc_equity" order="2" weight="1"/>
  </link:calculationLink>
  <link:calculationLink xlink:type="extended" xlink:role="http://acme.example/role/IncomeStatement">
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_Revenues" xlink:label="loc_revenue"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_CostOfRevenue" xlink:label="loc_cost"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_GrossProfit" xlink:label="loc_gross"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_OperatingExpenses" xlink:label="loc_opex"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_OperatingIncomeLoss" xlink:label="loc_opinc"/>
    <link:calculationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item" xlink:from="loc_gross" xlink:to="loc_revenue" order="1" weight="1"/>
    <link:calculationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item" xlink:from="loc_gross" xlink:to="loc_cost" order="2" weight="-1"/>
    <link:calculationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item" xlink:from="loc_opinc" xlink:to="loc_gross" order="1" weight="1"/>
    <link:calculationArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item" xlink:from="loc_opinc" xlink:to="loc_opex" order="2" weight="-1"/>
  </link:calculationLink>
</link:linkbase>
"#;

const LABELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
               xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:labelLink xlink:type="extended" xlink:role="http://www.xbrl.org/2003/role/link">
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_Revenues" xlink:label="loc_revenue"/>
    <link:label xlink:type="resource" xlink:label="lab_revenue" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Net revenues</link:label>
    <link:label xlink:type="resource" xlink:label="lab_revenue" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="de">Umsatzerlöse</link:label>
    <link:labelArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label" xlink:from="loc_revenue" xlink:to="lab_revenue"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_GrossProfit" xlink:label="loc_gross"/>
    <link:label xlink:type="resource" xlink:label="lab_gross" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Gross profit</link:label>
    <link:label xlink:type="resource" xlink:label="lab_gross" xlink:role="http://www.xbrl.org/2003/role/totalLabel" xml:lang="en-US">Total gross profit</link:label>
    <link:labelArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label" xlink:from="loc_gross" xlink:to="lab_gross"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#us-gaap_Assets" xlink:label="loc_assets"/>
    <link:label xlink:type="resource" xlink:label="lab_assets" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Assets</link:label>
    <link:label xlink:type="resource" xlink:label="lab_assets" xlink:role="http://www.xbrl.org/2003/role/totalLabel" xml:lang="en-US">Total assets</link:label>
    <link:labelArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label" xlink:from="loc_assets" xlink:to="lab_assets"/>
    <link:loc xlink:type="locator" xlink:href="acme.xsd#acme_WidgetRoyalties" xlink:label="loc_royalties"/>
    <link:label xlink:type="resource" xlink:label="lab_royalties" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Widget royalties</link:label>
    <link:labelArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label" xlink:from="loc_royalties" xlink:to="lab_royalties"/>
  </link:labelLink>
</link:linkbase>
"#;
