//! Column names of the raw sales extract, the cleaned fact table and the
//! aggregate views.

pub const ORDER_ID: &str = "OrderID";
pub const ORDER_DATE: &str = "OrderDate";
pub const SHIPPED_DATE: &str = "ShippedDate";
pub const CUSTOMER_ID: &str = "CustomerID";
pub const CUSTOMER_COUNTRY: &str = "CustomerCountry";
pub const EMPLOYEE_NAME: &str = "EmployeeName";
pub const PRODUCT_ID: &str = "ProductID";
pub const PRODUCT_NAME: &str = "ProductName";
pub const CATEGORY_NAME: &str = "CategoryName";
pub const QUANTITY: &str = "Quantity";
pub const LINE_TOTAL: &str = "LineTotal";

pub const DEFAULT_DATE_COLUMNS: [&str; 5] = [
    ORDER_DATE,
    SHIPPED_DATE,
    "PaidDate",
    "SubmittedDate",
    "CreationDate",
];

// Derived on the fact table.
pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const QUARTER: &str = "Quarter";
pub const DAY_OF_WEEK: &str = "DayOfWeek";
pub const MONTH_NAME: &str = "MonthName";
pub const DELIVERY_DAYS: &str = "DeliveryDays";
pub const AMOUNT_CATEGORY: &str = "AmountCategory";

pub const TEMPORAL_COLUMNS: [&str; 5] = [YEAR, MONTH, QUARTER, DAY_OF_WEEK, MONTH_NAME];

// Aggregate view columns.
pub const TOTAL_SALES: &str = "TotalSales";
pub const NUM_ORDERS: &str = "NumOrders";
pub const NUM_CUSTOMERS: &str = "NumCustomers";
pub const TOTAL_QUANTITY: &str = "TotalQuantity";
pub const CATEGORY: &str = "Category";
pub const PRODUCT: &str = "Product";
pub const COUNTRY: &str = "Country";
pub const EMPLOYEE: &str = "Employee";

pub const TOTAL_REVENUE: &str = "TotalRevenue";
pub const TOTAL_ORDERS: &str = "TotalOrders";
pub const TOTAL_CUSTOMERS: &str = "TotalCustomers";
pub const TOTAL_PRODUCTS: &str = "TotalProducts";
pub const AVG_ORDER_VALUE: &str = "AvgOrderValue";
pub const AVG_DELIVERY_DAYS: &str = "AvgDeliveryDays";
